use serde::Deserialize;

/// Payload of `Home.getGeneralInfo`; only the home id is of interest.
#[derive(Deserialize, Clone, Debug)]
pub struct GeneralInfoData {
    #[serde(default)]
    pub id: Option<String>,
}
