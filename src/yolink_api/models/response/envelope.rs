use crate::error::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

pub const SUCCESS_CODE: &str = "000000";
pub const UNAUTHORIZED_CODE: &str = "401";

/// The `{code, desc, data}` wrapper around every API response. `data` stays raw until the
/// code has been checked.
#[derive(Deserialize, Debug)]
pub struct Envelope {
    pub code: String,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub msgid: Option<i64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl Envelope {
    pub fn from_body(context: &str, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::parse(context, e, body))
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == UNAUTHORIZED_CODE
    }

    /// Decodes the payload into `T`, or fails with the vendor's code and description.
    pub fn into_data<T: DeserializeOwned>(self, context: &str) -> Result<T> {
        if !self.is_success() {
            return Err(Error::Vendor {
                code: self.code,
                desc: self.desc,
            });
        }
        let Some(data) = self.data else {
            return Err(Error::Parse {
                message: format!("{} carried no data", context),
                body: String::new(),
            });
        };
        serde_json::from_str(data.get()).map_err(|e| Error::parse(context, e, data.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yolink_api::models::response::device_list_response::DeviceListData;

    #[test]
    fn failure_code_skips_payload_decoding() {
        // data is not a device list, but it must never be looked at
        let body = r#"{"code":"010000","desc":"Service not available","data":"garbage"}"#;
        let envelope = Envelope::from_body("devices response", body).unwrap();

        match envelope.into_data::<DeviceListData>("devices response") {
            Err(Error::Vendor { code, desc }) => {
                assert_eq!(code, "010000");
                assert_eq!(desc, "Service not available");
            }
            other => panic!("expected vendor error, got {:?}", other),
        }
    }

    #[test]
    fn success_without_data_is_parse_error() {
        let envelope = Envelope::from_body("x", r#"{"code":"000000","desc":"Success"}"#).unwrap();
        assert!(matches!(
            envelope.into_data::<DeviceListData>("x"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn malformed_body_is_parse_error_with_body() {
        match Envelope::from_body("devices response", "<html>") {
            Err(Error::Parse { body, .. }) => assert_eq!(body, "<html>"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
