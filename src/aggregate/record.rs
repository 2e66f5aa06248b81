use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::RecordIssue;
use crate::resolve::{deserialize_location, Coordinate};

/// A caller-supplied damage report. Read-only input to the aggregation pipeline.
///
/// Deserializes from camelCase JSON and also from the storage column names
/// (`gnd_name`, `damage_level`, `estimated_damage_lkr`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRecord {
    #[serde(default, alias = "location", deserialize_with = "deserialize_location")]
    pub coordinate: Option<Coordinate>,
    #[serde(default, alias = "gnd_code")]
    pub division_code: Option<String>,
    #[serde(default, alias = "gnd_name")]
    pub division_name: Option<String>,
    /// Out-of-range levels deserialize and are rejected by [`DamageRecord::validate`].
    #[serde(default, alias = "damage_level")]
    pub damage_level: i64,
    #[serde(alias = "estimated_damage_lkr")]
    pub estimated_damage_amount: f64,
    #[serde(default, alias = "affected_residents", deserialize_with = "deserialize_count")]
    pub affected_count: u64,
    #[serde(default, alias = "property_type")]
    pub property_category: String,
}

/// A missing or null count reads as zero.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

impl DamageRecord {
    /// A record for `name` with the given measurements and no coordinate or code.
    pub fn named(name: &str, damage_level: u8, amount: f64, affected: u64, category: &str) -> Self {
        Self {
            coordinate: None,
            division_code: None,
            division_name: Some(name.to_string()),
            damage_level: i64::from(damage_level),
            estimated_damage_amount: amount,
            affected_count: affected,
            property_category: category.to_string(),
        }
    }

    /// Read one element of a JSON batch. A shape that cannot be a record at all
    /// is reported as [`RecordIssue::Malformed`] so the rest of the batch goes on.
    pub fn from_value(value: &Value) -> Result<Self, RecordIssue> {
        Self::deserialize(value).map_err(|e| RecordIssue::Malformed(e.to_string()))
    }

    /// Check the measurement ranges. All issues are reported, not just the first.
    pub fn validate(&self) -> Result<(), Vec<RecordIssue>> {
        let mut issues = Vec::new();
        if !(1..=10).contains(&self.damage_level) {
            issues.push(RecordIssue::DamageLevel(self.damage_level));
        }
        if !self.estimated_damage_amount.is_finite() || self.estimated_damage_amount < 0.0 {
            issues.push(RecordIssue::DamageAmount(self.estimated_damage_amount));
        }
        if self.property_category.trim().is_empty() {
            issues.push(RecordIssue::PropertyCategory);
        }
        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::DamageRecord;
    use crate::error::RecordIssue;
    use crate::resolve::Coordinate;

    #[test]
    fn camel_case_json() {
        let record: DamageRecord = serde_json::from_str(r#"{
            "divisionName": "Kandy North",
            "divisionCode": "KN-1",
            "damageLevel": 8,
            "estimatedDamageAmount": 100000,
            "affectedCount": 5,
            "propertyCategory": "house",
            "coordinate": { "lat": 7.29, "lng": 80.63 }
        }"#).unwrap();
        assert_eq!(record.division_name.as_deref(), Some("Kandy North"));
        assert_eq!(record.coordinate, Some(Coordinate::new(7.29, 80.63)));
        assert_eq!(record.estimated_damage_amount, 100000.0);
    }

    #[test]
    fn storage_column_names() {
        let record: DamageRecord = serde_json::from_str(r#"{
            "gnd_name": null,
            "gnd_code": null,
            "location": "POINT(80.63 7.29)",
            "damage_level": 3,
            "estimated_damage_lkr": 2500.5,
            "affected_residents": 2,
            "property_type": "shop"
        }"#).unwrap();
        assert_eq!(record.division_name, None);
        assert_eq!(record.coordinate, Some(Coordinate::new(7.29, 80.63)));
        assert_eq!(record.property_category, "shop");
    }

    #[test]
    fn validation_collects_every_issue() {
        let mut record = DamageRecord::named("X", 0, -1.0, 0, " ");
        assert_eq!(record.validate(), Err(vec![
            RecordIssue::DamageLevel(0),
            RecordIssue::DamageAmount(-1.0),
            RecordIssue::PropertyCategory,
        ]));

        record.damage_level = 10;
        record.estimated_damage_amount = 0.0;
        record.property_category = "house".to_string();
        assert_eq!(record.validate(), Ok(()));

        record.estimated_damage_amount = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn lenient_fields_defer_to_validation() {
        let record = DamageRecord::from_value(&json!({
            "gnd_name": "Galle",
            "damage_level": 300,
            "estimated_damage_lkr": 10,
            "affected_residents": null,
        })).unwrap();
        assert_eq!(record.affected_count, 0);
        assert_eq!(record.validate(), Err(vec![RecordIssue::DamageLevel(300), RecordIssue::PropertyCategory]));
    }

    #[test]
    fn unreadable_element_is_malformed() {
        let issue = DamageRecord::from_value(&json!({ "damage_level": 3, "estimated_damage_lkr": "lots" })).unwrap_err();
        assert!(matches!(issue, RecordIssue::Malformed(_)));
        assert!(matches!(DamageRecord::from_value(&json!(42)), Err(RecordIssue::Malformed(_))));
    }
}
