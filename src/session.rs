//! What a logged-in member or admin may do against the registry.
//!
//! The registry itself accepts any upsert. Members are held to one
//! submission per day and must either confirm presence or give a
//! justification, never both. Admins may write any combination for any
//! directory member.

use chrono::NaiveDateTime;

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::model::{AttendanceEntry, EntryFields, PersonRecord};
use crate::registry::Registry;
use crate::store::KvStore;

fn normalize(fields: EntryFields) -> EntryFields {
    EntryFields {
        justification: fields.justification.trim().to_string(),
        present: fields.present,
    }
}

pub fn submit<'r, S: KvStore>(
    registry: &'r mut Registry<S>,
    person: &PersonRecord,
    fields: EntryFields,
    now: NaiveDateTime,
) -> Result<&'r AttendanceEntry> {
    let fields = normalize(fields);
    match (fields.present, fields.justification.is_empty()) {
        (true, false) => {
            return Err(Error::InvalidSubmission(
                "Confirme a presença ou justifique a falta, não ambos.".to_string(),
            ));
        }
        // A blank submission is refused instead of stored as an empty record.
        (false, true) => {
            return Err(Error::InvalidSubmission(
                "Confirme a presença ou justifique sua falta.".to_string(),
            ));
        }
        _ => {}
    }

    if let Some(existing) = registry.find_today(&person.id, now.date()) {
        return Err(Error::AlreadyRecorded(existing.status_label().to_string()));
    }
    Ok(registry.upsert(&person.id, fields, now))
}

pub fn admin_edit<'r, S: KvStore>(
    registry: &'r mut Registry<S>,
    directory: &Directory,
    person_id: &str,
    fields: EntryFields,
    now: NaiveDateTime,
) -> Result<&'r AttendanceEntry> {
    let person = directory.require(person_id)?;
    tracing::debug!(person = %person.name, "admin edit");
    Ok(registry.upsert(&person.id, normalize(fields), now))
}
