//! Always-required record fields.
//!
//! Person modules carry personal data; structure modules (zones, family
//! groups) carry their own descriptive fields. The submit gate only asks a
//! profile which of its required fields are still empty.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::MemberModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    Widowed,
    Divorced,
    Other,
}

/// Residence address shared by people and structures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub country: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub urban_sector: Option<String>,
    pub address: Option<String>,
    pub reference_place: Option<String>,
}

impl Address {
    fn missing_into(&self, missing: &mut Vec<&'static str>) {
        let fields = [
            ("residenceCountry", &self.country),
            ("residenceDepartment", &self.department),
            ("residenceProvince", &self.province),
            ("residenceDistrict", &self.district),
            ("residenceUrbanSector", &self.urban_sector),
            ("residenceAddress", &self.address),
            ("referencePlace", &self.reference_place),
        ];
        missing.extend(
            fields
                .into_iter()
                .filter(|(_, value)| is_blank(value))
                .map(|(name, _)| name),
        );
    }
}

/// Personal fields of a person record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PersonalData {
    pub first_names: Option<String>,
    pub last_names: Option<String>,
    pub gender: Option<Gender>,
    pub origin_country: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<MaritalStatus>,
    pub number_of_children: Option<u32>,
    pub conversion_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub residence: Address,
}

impl PersonalData {
    /// Names of required fields that are empty.
    ///
    /// Conversion date, email and phone are optional.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.first_names) {
            missing.push("firstNames");
        }
        if is_blank(&self.last_names) {
            missing.push("lastNames");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        if is_blank(&self.origin_country) {
            missing.push("originCountry");
        }
        if self.birth_date.is_none() {
            missing.push("birthDate");
        }
        if self.marital_status.is_none() {
            missing.push("maritalStatus");
        }
        if self.number_of_children.is_none() {
            missing.push("numberOfChildren");
        }
        self.residence.missing_into(&mut missing);
        missing
    }
}

/// Descriptive fields of a zone or family group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct StructureData {
    pub name: Option<String>,
    /// Family groups only; zones leave it empty
    pub service_time: Option<String>,
    pub location: Address,
}

impl StructureData {
    pub fn missing_fields(&self, requires_service_time: bool) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push("name");
        }
        if requires_service_time && is_blank(&self.service_time) {
            missing.push("serviceTime");
        }
        // Zones are described by their district, not a street address.
        let location = &self.location;
        let fields = [
            ("country", &location.country),
            ("department", &location.department),
            ("province", &location.province),
            ("district", &location.district),
        ];
        missing.extend(
            fields
                .into_iter()
                .filter(|(_, value)| is_blank(value))
                .map(|(name, _)| name),
        );
        if requires_service_time {
            let fields = [
                ("urbanSector", &location.urban_sector),
                ("address", &location.address),
                ("referencePlace", &location.reference_place),
            ];
            missing.extend(
                fields
                    .into_iter()
                    .filter(|(_, value)| is_blank(value))
                    .map(|(name, _)| name),
            );
        }
        missing
    }
}

/// Required non-relational fields of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    Person(PersonalData),
    FamilyGroup(StructureData),
    Zone(StructureData),
}

impl Profile {
    /// Names of required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self {
            Self::Person(data) => data.missing_fields(),
            Self::FamilyGroup(data) => data.missing_fields(true),
            Self::Zone(data) => data.missing_fields(false),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Whether this profile kind is edited by `module`.
    pub fn fits(&self, module: MemberModule) -> bool {
        match self {
            Self::Person(_) => !module.is_structure(),
            Self::FamilyGroup(_) => module == MemberModule::FamilyGroup,
            Self::Zone(_) => module == MemberModule::Zone,
        }
    }

    /// An empty profile of the kind `module` edits.
    pub fn empty_for(module: MemberModule) -> Self {
        match module {
            MemberModule::FamilyGroup => Self::FamilyGroup(StructureData::default()),
            MemberModule::Zone => Self::Zone(StructureData::default()),
            _ => Self::Person(PersonalData::default()),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn address() -> Address {
        Address {
            country: Some("Peru".to_string()),
            department: Some("Lima".to_string()),
            province: Some("Lima".to_string()),
            district: Some("Independencia".to_string()),
            urban_sector: Some("Payet".to_string()),
            address: Some("Jr. Las Flores 123".to_string()),
            reference_place: Some("Near the market".to_string()),
        }
    }

    pub fn person() -> PersonalData {
        PersonalData {
            first_names: Some("Maria Elena".to_string()),
            last_names: Some("Quispe Rojas".to_string()),
            gender: Some(Gender::Female),
            origin_country: Some("Peru".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1988, 4, 12),
            marital_status: Some(MaritalStatus::Married),
            number_of_children: Some(2),
            conversion_date: None,
            email: None,
            phone_number: None,
            residence: address(),
        }
    }

    pub fn zone() -> StructureData {
        StructureData {
            name: Some("Zone A".to_string()),
            service_time: None,
            location: address(),
        }
    }
}
