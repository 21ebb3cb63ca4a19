use http::header::CONTENT_TYPE;
use http::Request;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::coerce;
use crate::context::DecodeContext;
use crate::errors::{DecodeError, Result};
use crate::shape::{Record, Slot};

/// Media type that switches on the whole-body JSON decode. Compared verbatim.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// True when the request's `Content-Type` is exactly [`JSON_MEDIA_TYPE`].
pub fn is_json_request<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes() == JSON_MEDIA_TYPE.as_bytes())
}

/// Decode the JSON value at the start of `body` into `dest`.
///
/// Keys present in the body overwrite the matching fields, nested objects
/// merge key by key, and every other field keeps its current value. Bytes
/// after the first complete value are ignored.
pub(crate) fn decode_body<T>(body: &[u8], dest: &mut T) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut de = serde_json::Deserializer::from_slice(body);
    let patch = Value::deserialize(&mut de)?;
    let mut merged = serde_json::to_value(&*dest)?;
    merge(&mut merged, patch);
    *dest = serde_json::from_value(merged)?;
    Ok(())
}

fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

impl DecodeContext<'_> {
    /// Walk the destination itself: a record, or an optional record that is
    /// allocated first. Anything else is not a valid destination and is left
    /// as it was.
    pub(crate) fn walk_destination(&mut self, dest: Slot<'_>) -> Result<()> {
        match dest {
            Slot::Record(record) => record.walk(self),
            Slot::Pointer(pointer) if pointer.holds_record() => {
                self.walk_destination(pointer.get_or_insert())
            }
            other => Err(DecodeError::InvalidDestination { found: other.describe() }),
        }
    }

    /// Fill every annotated field of `record`, in declaration order.
    ///
    /// Stops at the first error; fields already written stay written.
    pub(crate) fn walk_record<T: Record>(&mut self, record: &mut T) -> Result<()> {
        for field in T::shape().fields {
            let Some((source, name)) = field.tags.resolve() else {
                continue;
            };

            match (field.access)(record) {
                Slot::Record(nested) => {
                    let mark = self.path.enter_record(name);
                    let result = nested.walk(self);
                    self.path.restore(mark);
                    result?;
                }
                slot => {
                    let mark = self.path.push_leaf(name);
                    let value = self.sources.resolve(source, self.path.as_str());
                    tracing::trace!(
                        field = self.path.as_str(),
                        %source,
                        present = value.is_some(),
                        "resolved field"
                    );
                    self.path.restore(mark);

                    let Some(raw) = value else {
                        continue;
                    };
                    coerce(slot, &raw).map_err(|err| err.at(self.path.joined(name)))?;
                }
            }
        }
        Ok(())
    }
}
