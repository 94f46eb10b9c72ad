use crate::error::{Error, Result};
use crate::model::{AdminRecord, PersonRecord};
use csv::ReaderBuilder;
use std::{collections::HashMap, fs::File, path::Path};

const DEFAULT_PERSONNEL: [(&str, &str, &str); 10] = [
    ("1", "militar1", "Capitão"),
    ("2", "militar2", "Capitão"),
    ("3", "militar3", "1º Tenente"),
    ("4", "militar4", "1º Tenente"),
    ("5", "militar5", "1º Tenente"),
    ("6", "militar6", "1º Tenente"),
    ("7", "militar7", "Sub Tenente"),
    ("8", "militar8", "Sub Tenente"),
    ("9", "militar9", "1º Sargento"),
    ("10", "militar10", "2º Sargento"),
];

/// Read-only personnel lookup, fixed once loaded.
#[derive(Debug, Clone)]
pub struct Directory {
    people: Vec<PersonRecord>,
    by_id: HashMap<String, usize>,
}

impl Directory {
    pub fn new(people: Vec<PersonRecord>) -> Self {
        let by_id = people
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        Self { people, by_id }
    }

    pub fn builtin() -> Self {
        Self::new(
            DEFAULT_PERSONNEL
                .iter()
                .map(|(id, name, rank)| PersonRecord::new(*id, *name, *rank))
                .collect(),
        )
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let mut people = Vec::new();
        for result in rdr.deserialize() {
            let r: PersonRecord = result?;
            people.push(r);
        }
        Ok(Self::new(people))
    }

    pub fn get(&self, id: &str) -> Option<&PersonRecord> {
        self.by_id.get(id).map(|&i| &self.people[i])
    }

    pub fn list_all(&self) -> &[PersonRecord] {
        &self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Like [`Directory::get`] but a miss is a [`Error::LookupMiss`].
    pub fn require(&self, id: &str) -> Result<&PersonRecord> {
        self.get(id)
            .ok_or_else(|| Error::LookupMiss(format!("person id {id}")))
    }

    /// Member login: names compare case-insensitively.
    pub fn login(&self, name: &str) -> Result<&PersonRecord> {
        let wanted = name.trim().to_lowercase();
        self.people
            .iter()
            .find(|p| p.name.to_lowercase() == wanted)
            .ok_or_else(|| Error::InvalidCredential("Nome não encontrado!".to_string()))
    }
}

pub fn default_admins() -> Vec<AdminRecord> {
    [("admin", "123"), ("criador", "321")]
        .iter()
        .map(|(u, p)| AdminRecord {
            username: u.to_string(),
            password: p.to_string(),
        })
        .collect()
}

/// Exact username and password match; no lockout.
pub fn admin_login<'a>(
    admins: &'a [AdminRecord],
    username: &str,
    password: &str,
) -> Result<&'a AdminRecord> {
    admins
        .iter()
        .find(|a| a.username == username && a.password == password)
        .ok_or_else(|| Error::InvalidCredential("Administrador não encontrado!".to_string()))
}
