//! Lenient body decoding shared by both services

use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

/// Decode the first JSON value in `body` as a `T`
///
/// The value must be an object. Anything after it is ignored, the way a
/// streaming decoder reading one value off the request would behave.
pub fn decode_object<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Value>();
    match values.next() {
        Some(Ok(value @ Value::Object(_))) => T::deserialize(value),
        Some(Ok(_)) => Err(serde_json::Error::custom("expected a JSON object")),
        Some(Err(err)) => Err(err),
        None => Err(serde_json::Error::custom("empty body")),
    }
}
