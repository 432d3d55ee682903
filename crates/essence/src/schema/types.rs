//! Attribute vocabularies shared by rules, extraction and records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One recognized structured output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Fragrance concentration (EDP, Parfum, ...).
    Concentration,
    /// How the product is dispensed (spray, splash, ...).
    DispenserType,
    /// Target gender.
    Gender,
    /// Size magnitude, optionally with its unit.
    Size,
    /// Size unit on its own.
    Unit,
    /// Brand identifier.
    Brand,
    /// Cleaned product name.
    Name,
}

impl AttributeKind {
    /// Every attribute kind, in evaluation-report order.
    pub const ALL: [AttributeKind; 7] = [
        AttributeKind::Concentration,
        AttributeKind::DispenserType,
        AttributeKind::Gender,
        AttributeKind::Size,
        AttributeKind::Unit,
        AttributeKind::Brand,
        AttributeKind::Name,
    ];

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AttributeKind::Concentration => "concentration",
            AttributeKind::DispenserType => "dispenser type",
            AttributeKind::Gender => "gender",
            AttributeKind::Size => "size",
            AttributeKind::Unit => "unit",
            AttributeKind::Brand => "brand",
            AttributeKind::Name => "name",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttributeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "concentration" | "conc" => Ok(AttributeKind::Concentration),
            "dispenser" | "dispensertype" | "type" => Ok(AttributeKind::DispenserType),
            "gender" | "sex" => Ok(AttributeKind::Gender),
            "size" => Ok(AttributeKind::Size),
            "unit" => Ok(AttributeKind::Unit),
            "brand" => Ok(AttributeKind::Brand),
            "name" | "product" => Ok(AttributeKind::Name),
            _ => Err(format!("unknown attribute '{}'", s.trim())),
        }
    }
}

/// Fragrance concentration class used by the catalog.
///
/// `Parfum` is the catalog's generic fragrance class: eau de toilette and
/// unqualified "parfum" products are filed under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Concentration {
    Parfum,
    #[serde(rename = "EDP")]
    Edp,
    #[serde(rename = "EDC")]
    Edc,
    Extrait,
    AfterShave,
}

impl Concentration {
    pub const ALL: [Concentration; 5] = [
        Concentration::Parfum,
        Concentration::Edp,
        Concentration::Edc,
        Concentration::Extrait,
        Concentration::AfterShave,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Concentration::Parfum => "Parfum",
            Concentration::Edp => "EDP",
            Concentration::Edc => "EDC",
            Concentration::Extrait => "Extrait",
            Concentration::AfterShave => "AfterShave",
        }
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Concentration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "parfum" | "edt" | "eaudetoilette" => Ok(Concentration::Parfum),
            "edp" | "eaudeparfum" => Ok(Concentration::Edp),
            "edc" | "eaudecologne" | "cologne" => Ok(Concentration::Edc),
            "extrait" | "extraitdeparfum" => Ok(Concentration::Extrait),
            "aftershave" | "as" => Ok(Concentration::AfterShave),
            _ => Err(format!(
                "unrecognized concentration '{}' (expected one of {})",
                s.trim(),
                one_of(&Concentration::ALL)
            )),
        }
    }
}

/// How a product is dispensed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispenserType {
    Spray,
    Splash,
    RollOn,
    Refill,
    Stick,
}

impl DispenserType {
    pub const ALL: [DispenserType; 5] = [
        DispenserType::Spray,
        DispenserType::Splash,
        DispenserType::RollOn,
        DispenserType::Refill,
        DispenserType::Stick,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DispenserType::Spray => "Spray",
            DispenserType::Splash => "Splash",
            DispenserType::RollOn => "RollOn",
            DispenserType::Refill => "Refill",
            DispenserType::Stick => "Stick",
        }
    }
}

impl fmt::Display for DispenserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DispenserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "spray" | "vapo" | "vaporisateur" => Ok(DispenserType::Spray),
            "splash" => Ok(DispenserType::Splash),
            "rollon" => Ok(DispenserType::RollOn),
            "refill" | "recharge" => Ok(DispenserType::Refill),
            "stick" => Ok(DispenserType::Stick),
            _ => Err(format!(
                "unrecognized dispenser type '{}' (expected one of {})",
                s.trim(),
                one_of(&DispenserType::ALL)
            )),
        }
    }
}

/// Target gender of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Unisex,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unisex];

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unisex => "Unisex",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "male" | "m" | "men" | "man" | "homme" => Ok(Gender::Male),
            "female" | "f" | "women" | "woman" | "femme" => Ok(Gender::Female),
            "unisex" | "u" => Ok(Gender::Unisex),
            _ => Err(format!(
                "unrecognized gender '{}' (expected one of {})",
                s.trim(),
                one_of(&Gender::ALL)
            )),
        }
    }
}

/// Unit of a size magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    Ml,
    Oz,
    G,
}

impl SizeUnit {
    pub const ALL: [SizeUnit; 3] = [SizeUnit::Ml, SizeUnit::Oz, SizeUnit::G];

    pub fn label(&self) -> &'static str {
        match self {
            SizeUnit::Ml => "ml",
            SizeUnit::Oz => "oz",
            SizeUnit::G => "g",
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "ml" | "mls" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Ok(SizeUnit::Ml)
            }
            "oz" | "floz" | "ounce" | "ounces" => Ok(SizeUnit::Oz),
            "g" | "gr" | "gram" | "grams" => Ok(SizeUnit::G),
            _ => Err(format!(
                "unrecognized unit '{}' (expected one of {})",
                s.trim(),
                one_of(&SizeUnit::ALL)
            )),
        }
    }
}

/// Lowercase and drop spaces, dots, hyphens and underscores so that
/// "Roll-On", "roll on" and "ROLL_ON" compare equal.
/// Comma-separated labels, for error messages.
fn one_of<T: fmt::Display>(values: &[T]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
