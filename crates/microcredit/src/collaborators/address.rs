use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const VIACEP_BASE_URL: &str = "https://viacep.com.br/ws";

const POSTAL_CODE_DIGITS: usize = 8;

/// Brazilian CEP reduced to its eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PostalCode(String);

impl PostalCode {
    /// Accepts any punctuation ("57000-000", "57.000-000"); rejects anything without exactly eight digits.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != POSTAL_CODE_DIGITS {
            return Err(AddressError::InvalidPostalCode(raw.to_string()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", &self.0[..5], &self.0[5..])
    }
}

/// Street-level address used to prefill the intake form. Missing parts come back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, postal_code: &PostalCode) -> Result<Address, AddressError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("postal code '{0}' must contain exactly 8 digits")]
    InvalidPostalCode(String),
    #[error("postal code {0} not found")]
    NotFound(PostalCode),
    #[error("address lookup unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

impl ViaCepResponse {
    // ViaCEP has answered both `"erro": true` and `"erro": "true"`.
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// ViaCEP-compatible client: `GET {base}/{cep}/json/`.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AddressError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AddressError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AddressLookup for ViaCepClient {
    async fn lookup(&self, postal_code: &PostalCode) -> Result<Address, AddressError> {
        let url = format!("{}/{}/json/", self.base_url, postal_code.as_str());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| AddressError::Unavailable(err.to_string()))?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST
            || response.status() == reqwest::StatusCode::NOT_FOUND
        {
            return Err(AddressError::NotFound(postal_code.clone()));
        }
        if !response.status().is_success() {
            return Err(AddressError::Unavailable(format!(
                "lookup answered {}",
                response.status()
            )));
        }

        let body: ViaCepResponse = response
            .json()
            .await
            .map_err(|err| AddressError::Unavailable(err.to_string()))?;
        if body.is_error() {
            return Err(AddressError::NotFound(postal_code.clone()));
        }

        debug!(postal_code = %postal_code, city = %body.localidade, "address resolved");
        Ok(Address {
            postal_code: postal_code.to_string(),
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postal_codes_normalize_to_digits() {
        let code = PostalCode::parse(" 57.000-000 ").expect("valid cep");
        assert_eq!(code.as_str(), "57000000");
        assert_eq!(code.to_string(), "57000-000");
    }

    #[test]
    fn postal_codes_need_eight_digits() {
        assert!(matches!(
            PostalCode::parse("5700-000"),
            Err(AddressError::InvalidPostalCode(_))
        ));
        assert!(PostalCode::parse("").is_err());
    }

    #[test]
    fn error_flag_accepts_bool_and_string() {
        let flagged: ViaCepResponse =
            serde_json::from_str(r#"{"erro": true}"#).expect("decode");
        assert!(flagged.is_error());
        let stringly: ViaCepResponse =
            serde_json::from_str(r#"{"erro": "true"}"#).expect("decode");
        assert!(stringly.is_error());
        let found: ViaCepResponse = serde_json::from_str(
            r#"{"cep":"57000-000","logradouro":"Rua A","bairro":"Centro","localidade":"Maceió","uf":"AL"}"#,
        )
        .expect("decode");
        assert!(!found.is_error());
        assert_eq!(found.localidade, "Maceió");
    }
}
