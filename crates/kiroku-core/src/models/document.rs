//! Document types, per-provider results and the orchestrator's output.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Kind of document submitted for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// 在留カード (residence card).
    ResidenceCard,
    /// 履歴書 (resume).
    Resume,
    /// 運転免許証 (driver's license).
    DriverLicense,
    /// タイムカード (attendance sheet).
    TimerCard,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::ResidenceCard,
        DocumentType::Resume,
        DocumentType::DriverLicense,
        DocumentType::TimerCard,
    ];

    /// Every field a provider may report for this document type.
    pub fn known_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ResidenceCard => &[
                "name",
                "birthday",
                "nationality",
                "gender",
                "address",
                "card_number",
                "visa_type",
                "expiry_date",
            ],
            Self::Resume => &[
                "name",
                "name_kana",
                "birthday",
                "gender",
                "nationality",
                "address",
                "phone",
                "email",
            ],
            Self::DriverLicense => &[
                "name",
                "birthday",
                "address",
                "license_number",
                "issue_date",
                "expiry_date",
                "license_type",
            ],
            Self::TimerCard => &["employee_name", "period"],
        }
    }

    /// Fields whose absence makes a result incomplete, in priority order.
    pub fn critical_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ResidenceCard => &["name", "birthday", "nationality"],
            Self::Resume => &["name", "birthday", "address"],
            Self::DriverLicense => &["name", "birthday", "license_number"],
            Self::TimerCard => &["employee_name", "period"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResidenceCard => "residence_card",
            Self::Resume => "resume",
            Self::DriverLicense => "driver_license",
            Self::TimerCard => "timer_card",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "residence_card" | "zairyu" => Ok(Self::ResidenceCard),
            "resume" | "rirekisho" => Ok(Self::Resume),
            "driver_license" | "license" => Ok(Self::DriverLicense),
            "timer_card" | "timecard" => Ok(Self::TimerCard),
            other => Err(format!("unknown document type: {}", other)),
        }
    }
}

/// Provider ordering used by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Provider A first, B as complement.
    PreferA,
    /// Provider B first, A as complement.
    PreferB,
    /// A and B concurrently, merged when both succeed.
    #[default]
    Auto,
}

/// How the final result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    ProviderA,
    ProviderB,
    ProviderC,
    Hybrid,
    None,
    Timeout,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderA => "provider_a",
            Self::ProviderB => "provider_b",
            Self::ProviderC => "provider_c",
            Self::Hybrid => "hybrid",
            Self::None => "none",
            Self::Timeout => "timeout",
        }
    }
}

/// Output of a single provider call. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Whether the backend produced a usable answer.
    pub success: bool,
    /// Extracted fields. Absent values are `None`.
    pub fields: BTreeMap<String, Option<String>>,
    /// Raw recognized text.
    pub raw_text: String,
    /// Failure description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderResult {
    pub fn success(fields: BTreeMap<String, Option<String>>, raw_text: impl Into<String>) -> Self {
        Self {
            success: true,
            fields,
            raw_text: raw_text.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            fields: BTreeMap::new(),
            raw_text: String::new(),
            error: Some(error.into()),
        }
    }

    /// Non-empty value of a field, if any.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Number of critical fields of `document_type` with no value.
    pub fn missing_critical(&self, document_type: DocumentType) -> usize {
        document_type
            .critical_fields()
            .iter()
            .filter(|f| self.value(f).is_none())
            .count()
    }

    /// True when more than `ratio` of the critical fields are absent.
    pub fn is_incomplete(&self, document_type: DocumentType, ratio: f32) -> bool {
        let critical = document_type.critical_fields().len();
        if critical == 0 {
            return false;
        }
        (self.missing_critical(document_type) as f32 / critical as f32) > ratio
    }

    /// Present fields with their values, dropping nulls and blanks.
    pub fn present_fields(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(k, v)| {
                let v = v.as_deref()?.trim();
                (!v.is_empty()).then(|| (k.clone(), v.to_string()))
            })
            .collect()
    }
}

/// Final answer of the orchestrator for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub method_used: ExtractionMethod,
    /// Confidence in `[0, 0.95]`.
    pub confidence: f32,
    pub fields: BTreeMap<String, String>,
    pub raw_text: String,
    /// Terminal failure kind when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExtractionError>,
}

impl ExtractionResult {
    /// Successful result built from one provider's answer.
    pub fn from_provider(
        result: &ProviderResult,
        method: ExtractionMethod,
        confidence: f32,
    ) -> Self {
        Self {
            success: true,
            method_used: method,
            confidence,
            fields: result.present_fields(),
            raw_text: result.raw_text.clone(),
            failure: None,
        }
    }

    /// Failed result. Confidence is zero and no fields are carried.
    pub fn failed(method: ExtractionMethod, failure: ExtractionError) -> Self {
        Self {
            success: false,
            method_used: method,
            confidence: 0.0,
            fields: BTreeMap::new(),
            raw_text: String::new(),
            failure: Some(failure),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
