//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Marshaling between application values and raw argument text.

use crate::protocol::ProtocolError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Marshals a value into argument text.
///
/// A value that serializes to JSON `null` (such as `()` or `None`) produces
/// an empty string, which the codec sends as "no arguments".
///
/// # Examples
///
/// ```rust
/// use sockio::protocol::marshal;
///
/// assert_eq!(marshal(&"hello").unwrap(), "\"hello\"");
/// assert_eq!(marshal(&()).unwrap(), "");
/// ```
pub fn marshal<T: Serialize + ?Sized>(value: &T) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(value)?;
    if text == "null" {
        Ok(String::new())
    } else {
        Ok(text)
    }
}

/// Decodes argument text received from the peer.
///
/// Empty argument text decodes as JSON `null`, so `Option<T>` and `()` can
/// be used for events sent without arguments.
///
/// # Examples
///
/// ```rust
/// use sockio::protocol::unmarshal;
///
/// let text: String = unmarshal("\"hello\"").unwrap();
/// assert_eq!(text, "hello");
///
/// let nothing: Option<u32> = unmarshal("").unwrap();
/// assert_eq!(nothing, None);
/// ```
pub fn unmarshal<T: DeserializeOwned>(args: &str) -> Result<T, ProtocolError> {
    let text = if args.is_empty() { "null" } else { args };
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Chat {
        from: String,
        text: String,
    }

    #[test]
    fn test_marshal_struct() {
        let chat = Chat {
            from: "ann".into(),
            text: "hi".into(),
        };
        let text = marshal(&chat).unwrap();
        assert_eq!(text, r#"{"from":"ann","text":"hi"}"#);
        assert_eq!(unmarshal::<Chat>(&text).unwrap(), chat);
    }

    #[test]
    fn test_marshal_null_is_empty() {
        assert_eq!(marshal(&Option::<u8>::None).unwrap(), "");
        assert_eq!(marshal(&serde_json::Value::Null).unwrap(), "");
    }

    #[test]
    fn test_unmarshal_error() {
        assert!(matches!(
            unmarshal::<u32>("\"nope\""),
            Err(ProtocolError::Json { .. })
        ));
    }
}
