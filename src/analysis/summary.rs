//! Result summaries for the demographics screens.

use crate::analysis::{decode_handoff, AnalysisData, AnalysisResponse};
use crate::errors::{FlowError, SubmitErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Race,
    Age,
    Sex,
}

/// One row of a ranked list. `confidence` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub key: String,
    pub label: String,
    pub confidence: f64,
}

/// The row highlighted when the results screen opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub category: Category,
    pub item: RankedItem,
}

impl AnalysisResponse {
    /// Parse data forwarded from the capture screen, requiring a successful
    /// response that carries distributions.
    pub fn from_handoff(data: &str) -> Result<AnalysisData, FlowError> {
        let value = decode_handoff(data)?;
        let response: AnalysisResponse = serde_json::from_value(value).map_err(|_| {
            FlowError::submit(
                SubmitErrorKind::MalformedPayload,
                "Received data is not in the expected format or API indicated failure.",
            )
        })?;

        match response {
            AnalysisResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            AnalysisResponse { message, .. } => {
                let message = if message.is_empty() {
                    "Received data is not in the expected format or API indicated failure."
                        .to_string()
                } else {
                    message
                };
                Err(FlowError::submit(SubmitErrorKind::Server, message))
            }
        }
    }
}

/// Label with the highest probability. Ties go to the later label.
pub fn top_key(distribution: &BTreeMap<String, f64>) -> Option<&str> {
    distribution
        .iter()
        .reduce(|best, next| if best.1 > next.1 { best } else { next })
        .map(|(key, _)| key.as_str())
}

/// Numeric lower bound of an age range label: `"20-29"` → 20, `"70+"` → 70.
pub fn age_lower_bound(label: &str) -> Option<u32> {
    let head = match label.strip_suffix('+') {
        Some(head) => head,
        None => label.split('-').next().unwrap_or(label),
    };
    head.trim().parse().ok()
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn label_for(category: Category, key: &str) -> String {
    match category {
        Category::Race => capitalize(key),
        Category::Age => key.to_string(),
        Category::Sex => key.to_uppercase(),
    }
}

impl AnalysisData {
    fn distribution(&self, category: Category) -> &BTreeMap<String, f64> {
        match category {
            Category::Race => &self.race,
            Category::Age => &self.age,
            Category::Sex => &self.gender,
        }
    }

    /// Rows for one category. Race and sex sort by confidence descending;
    /// age sorts by range, youngest first.
    pub fn ranked(&self, category: Category) -> Vec<RankedItem> {
        let mut items: Vec<RankedItem> = self
            .distribution(category)
            .iter()
            .map(|(key, value)| RankedItem {
                key: key.clone(),
                label: label_for(category, key),
                confidence: value * 100.0,
            })
            .collect();

        match category {
            Category::Age => items.sort_by_key(|item| age_lower_bound(&item.key).unwrap_or(u32::MAX)),
            Category::Race | Category::Sex => {
                items.sort_by(|a, b| b.confidence.total_cmp(&a.confidence))
            }
        }
        items
    }

    pub fn top(&self, category: Category) -> Option<RankedItem> {
        let distribution = self.distribution(category);
        top_key(distribution).map(|key| RankedItem {
            key: key.to_string(),
            label: label_for(category, key),
            confidence: distribution[key] * 100.0,
        })
    }

    /// Top race if any, else top age, else the more likely sex.
    pub fn default_selection(&self) -> Option<Selection> {
        [Category::Race, Category::Age, Category::Sex]
            .into_iter()
            .find_map(|category| self.top(category).map(|item| Selection { category, item }))
    }
}
