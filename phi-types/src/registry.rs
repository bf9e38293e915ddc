use std::collections::HashMap;
use std::sync::RwLock;

use deid_common::AppError;
use serde::{Deserialize, Serialize};

use crate::phi_type::{CustomPHIType, PHIType};

/// Where a registered type came from. `Base` entries are seeded once at
/// construction and never removed; the rest accumulate as the run proceeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSource {
    Base,
    Custom,
    Rag,
    Discovered,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisteredType {
    pub name: String,
    pub description: String,
    pub source: TypeSource,
    pub base_type: Option<PHIType>,
    pub custom_type: Option<CustomPHIType>,
    pub examples: Vec<String>,
    pub aliases: Vec<String>,
}

impl RegisteredType {
    pub fn is_base_type(&self) -> bool {
        self.source == TypeSource::Base
    }

    /// Name used in the LLM prompt: bare for base types, `CUSTOM:name`
    /// otherwise.
    pub fn display_name(&self) -> String {
        if self.is_base_type() {
            self.name.clone()
        } else {
            format!("CUSTOM:{}", self.name)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptFormat {
    List,
    Json,
    Markdown,
}

type DiscoveryCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Central registry for every PHI type the run knows about: the 28 base
/// `PHIType` variants plus whatever custom/RAG/discovered types accumulate
/// at runtime. An explicit dependency rather than a process singleton, so
/// tests and concurrent jobs each get their own instance (`Arc<TypeRegistry>`
/// is the expected ownership shape for callers).
pub struct TypeRegistry {
    types: RwLock<HashMap<String, RegisteredType>>,
    discovery_callbacks: RwLock<Vec<DiscoveryCallback>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for phi_type in PHIType::ALL {
            let name = phi_type.as_str().to_string();
            types.insert(
                name.clone(),
                RegisteredType {
                    name,
                    description: base_type_description(phi_type).to_string(),
                    source: TypeSource::Base,
                    base_type: Some(phi_type),
                    custom_type: None,
                    examples: Vec::new(),
                    aliases: Vec::new(),
                },
            );
        }
        Self {
            types: RwLock::new(types),
            discovery_callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Register a user-defined custom type. A conflicting name is a silent
    /// no-op unless `overwrite` is set — matching the registry's
    /// last-writer-doesn't-win-by-default posture.
    pub fn register_custom_type(
        &self,
        custom_type: CustomPHIType,
        overwrite: bool,
    ) -> Result<(), AppError> {
        if custom_type.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "custom PHI type name cannot be empty".to_string(),
            ));
        }
        let mut types = self.types.write().map_err(|_| poisoned())?;
        if types.contains_key(&custom_type.name) && !overwrite {
            tracing::warn!(name = %custom_type.name, "PHI type already registered, skipping");
            return Ok(());
        }
        let name = custom_type.name.clone();
        types.insert(
            name.clone(),
            RegisteredType {
                name,
                description: custom_type.description.clone(),
                source: TypeSource::Custom,
                base_type: None,
                examples: custom_type.examples.clone(),
                aliases: custom_type.aliases.clone(),
                custom_type: Some(custom_type),
            },
        );
        Ok(())
    }

    /// Register a type surfaced by the regulation retriever.
    pub fn register_rag_type(
        &self,
        name: &str,
        description: &str,
        regulation_source: Option<String>,
        examples: Vec<String>,
    ) {
        let mut types = match self.types.write() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if types.contains_key(name) {
            return;
        }
        let custom_type = CustomPHIType {
            name: name.to_string(),
            description: description.to_string(),
            pattern: None,
            examples: examples.clone(),
            regulation_source,
            is_high_risk: false,
            masking_strategy: None,
            aliases: Vec::new(),
        };
        types.insert(
            name.to_string(),
            RegisteredType {
                name: name.to_string(),
                description: description.to_string(),
                source: TypeSource::Rag,
                base_type: None,
                custom_type: Some(custom_type),
                examples,
                aliases: Vec::new(),
            },
        );
    }

    /// Record a type the identifier emitted but the registry didn't already
    /// know. Idempotent: a second call for the same name is a no-op. Fires
    /// any registered discovery callbacks.
    pub fn record_discovered_type(&self, name: &str, description: Option<&str>) {
        {
            let types = match self.types.read() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            if types.contains_key(name) {
                return;
            }
        }
        let description = description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Discovered type: {name}"));
        {
            let mut types = match self.types.write() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            types.entry(name.to_string()).or_insert_with(|| RegisteredType {
                name: name.to_string(),
                description: description.clone(),
                source: TypeSource::Discovered,
                base_type: None,
                custom_type: None,
                examples: Vec::new(),
                aliases: Vec::new(),
            });
        }
        if let Ok(callbacks) = self.discovery_callbacks.read() {
            for cb in callbacks.iter() {
                cb(name, &description);
            }
        }
    }

    pub fn on_type_discovered<F>(&self, callback: F)
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.discovery_callbacks.write() {
            callbacks.push(Box::new(callback));
        }
    }

    /// Resolve a raw name (as emitted by the LLM, a tool, or a config file)
    /// to a canonical `PHIType` plus an optional custom-type name, following
    /// the fixed resolution order: exact canonical spelling, `CUSTOM:`
    /// prefix, alias lookup, then fall through to a newly discovered custom
    /// type.
    pub fn map_alias(&self, raw_name: &str) -> (PHIType, Option<String>) {
        if let Some(t) = PHIType::from_canonical_str(raw_name) {
            return (t, None);
        }
        if let Some(suffix) = raw_name.strip_prefix("CUSTOM:") {
            let suffix = suffix.trim();
            self.record_discovered_type(suffix, None);
            return (PHIType::Custom, Some(suffix.to_string()));
        }
        if let Ok(types) = self.types.read() {
            for reg in types.values() {
                if reg.aliases.iter().any(|a| a.eq_ignore_ascii_case(raw_name)) {
                    return match reg.base_type {
                        Some(t) => (t, None),
                        None => (PHIType::Custom, Some(reg.name.clone())),
                    };
                }
            }
        }
        let cleaned = raw_name.trim().to_string();
        self.record_discovered_type(&cleaned, None);
        (PHIType::Custom, Some(cleaned))
    }

    pub fn get_type(&self, name: &str) -> Option<RegisteredType> {
        self.types.read().ok()?.get(name).cloned()
    }

    pub fn get_base_type(&self, name: &str) -> Option<PHIType> {
        let types = self.types.read().ok()?;
        let reg = types.get(name)?;
        reg.base_type.or(if reg.source == TypeSource::Base {
            None
        } else {
            Some(PHIType::Custom)
        })
    }

    pub fn is_known_type(&self, name: &str) -> bool {
        self.types.read().map(|t| t.contains_key(name)).unwrap_or(false)
    }

    pub fn get_all_type_names(&self) -> Vec<String> {
        self.types
            .read()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_base_type_names(&self) -> Vec<String> {
        self.types
            .read()
            .map(|t| {
                t.values()
                    .filter(|r| r.is_base_type())
                    .map(|r| r.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_custom_type_names(&self) -> Vec<String> {
        self.types
            .read()
            .map(|t| {
                t.values()
                    .filter(|r| !r.is_base_type())
                    .map(|r| r.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Selectable labels for the LLM's structured-output schema: base type
    /// spellings plus `CUSTOM:<name>` for every known custom/RAG/discovered
    /// entry. `CUSTOM` and `OTHER` themselves are meta-types and are never
    /// emitted.
    pub fn type_enum_values(&self) -> Vec<String> {
        let types = match self.types.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let mut values: Vec<String> = Vec::new();
        for reg in types.values() {
            if reg.is_base_type() {
                if reg.name == PHIType::Custom.as_str() || reg.name == PHIType::Other.as_str() {
                    continue;
                }
                values.push(reg.name.clone());
            } else {
                values.push(format!("CUSTOM:{}", reg.name));
            }
        }
        values.sort();
        values
    }

    /// Render the known types for a prompt in one of three formats.
    /// `CUSTOM`/`OTHER` are never listed as selectable entries; callers
    /// explain those inline in the surrounding prompt text instead.
    pub fn get_types_for_prompt(
        &self,
        format: PromptFormat,
        include_base: bool,
        include_custom: bool,
        include_descriptions: bool,
    ) -> String {
        let types = match self.types.read() {
            Ok(guard) => guard,
            Err(_) => return String::new(),
        };
        let mut selected: Vec<&RegisteredType> = types
            .values()
            .filter(|r| !(r.is_base_type() && (r.name == "CUSTOM" || r.name == "OTHER")))
            .filter(|r| if r.is_base_type() { include_base } else { include_custom })
            .collect();
        selected.sort_by(|a, b| a.name.cmp(&b.name));

        match format {
            PromptFormat::List => format_as_list(&selected, include_descriptions),
            PromptFormat::Json => format_as_json(&selected, include_descriptions),
            PromptFormat::Markdown => format_as_markdown(&selected, include_descriptions),
        }
    }
}

fn format_as_list(types: &[&RegisteredType], include_descriptions: bool) -> String {
    let mut lines: Vec<String> = Vec::new();
    let base: Vec<&&RegisteredType> = types.iter().filter(|t| t.is_base_type()).collect();
    let custom: Vec<&&RegisteredType> = types.iter().filter(|t| !t.is_base_type()).collect();

    if !base.is_empty() {
        lines.push("Standard PHI Types:".to_string());
        for t in base {
            if include_descriptions {
                lines.push(format!("  - {}: {}", t.name, t.description));
            } else {
                lines.push(format!("  - {}", t.name));
            }
        }
    }
    if !custom.is_empty() {
        lines.push(String::new());
        lines.push("Custom PHI Types:".to_string());
        for t in custom {
            let display = t.display_name();
            if include_descriptions {
                lines.push(format!("  - {display}: {}", t.description));
            } else {
                lines.push(format!("  - {display}"));
            }
        }
    }
    lines.push(String::new());
    lines.push("For new/unknown types, use: CUSTOM:<type_name>".to_string());
    lines.join("\n")
}

fn format_as_json(types: &[&RegisteredType], include_descriptions: bool) -> String {
    let mut map = serde_json::Map::new();
    for t in types {
        let key = t.display_name();
        let desc = if include_descriptions { t.description.clone() } else { String::new() };
        map.insert(key, serde_json::Value::String(desc));
    }
    serde_json::to_string_pretty(&serde_json::Value::Object(map)).unwrap_or_default()
}

fn format_as_markdown(types: &[&RegisteredType], include_descriptions: bool) -> String {
    let mut lines = vec!["| Type | Description |".to_string(), "|------|-------------|".to_string()];
    for t in types {
        let desc = if include_descriptions { t.description.as_str() } else { "" };
        lines.push(format!("| {} | {} |", t.display_name(), desc));
    }
    lines.join("\n")
}

fn poisoned() -> AppError {
    AppError::Internal("PHI type registry lock poisoned".to_string())
}

fn base_type_description(phi_type: PHIType) -> &'static str {
    match phi_type {
        PHIType::Name => "Names",
        PHIType::Date => "Dates, except year",
        PHIType::Location => "Geographic subdivisions smaller than state",
        PHIType::Id => "General identifiers",
        PHIType::MedicalRecordNumber => "Medical record numbers",
        PHIType::AccountNumber => "Account numbers",
        PHIType::Contact => "General contact information",
        PHIType::Phone => "Phone numbers",
        PHIType::Fax => "Fax numbers",
        PHIType::Email => "Email addresses",
        PHIType::Url => "Web URLs",
        PHIType::IpAddress => "IP addresses",
        PHIType::AgeOver89 => "Ages over 89",
        PHIType::AgeOver90 => "Ages over 90",
        PHIType::Biometric => "Biometric identifiers",
        PHIType::Photo => "Photographs",
        PHIType::HospitalName => "Hospital/facility names",
        PHIType::DepartmentName => "Department names",
        PHIType::WardNumber => "Ward numbers",
        PHIType::BedNumber => "Bed numbers",
        PHIType::RareDisease => "Rare diseases",
        PHIType::GeneticInfo => "Genetic information",
        PHIType::DeviceId => "Device identifiers",
        PHIType::Certificate => "Certificate/license numbers",
        PHIType::Ssn => "Social Security Numbers",
        PHIType::InsuranceNumber => "Insurance numbers",
        PHIType::Custom => "Custom user-defined types",
        PHIType::Other => "Other identifiers",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn base_types_seeded_on_construction() {
        let registry = TypeRegistry::new();
        assert!(registry.is_known_type("NAME"));
        assert!(registry.is_known_type("CUSTOM"));
        assert_eq!(registry.get_base_type_names().len(), 28);
    }

    #[test]
    fn map_alias_resolves_canonical_prefix_and_fallback() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.map_alias("NAME"), (PHIType::Name, None));
        assert_eq!(
            registry.map_alias("CUSTOM:TW_NATIONAL_ID"),
            (PHIType::Custom, Some("TW_NATIONAL_ID".to_string()))
        );
        assert!(registry.is_known_type("TW_NATIONAL_ID"));

        let (t, custom) = registry.map_alias("occupation info");
        assert_eq!(t, PHIType::Custom);
        assert_eq!(custom, Some("occupation info".to_string()));
        assert!(registry.is_known_type("occupation info"));
    }

    #[test]
    fn map_alias_resolves_registered_alias() {
        let registry = TypeRegistry::new();
        let mut ct = CustomPHIType::new("TW_NATIONAL_ID", "Taiwan National ID").unwrap();
        ct.aliases.push("身份證".to_string());
        registry.register_custom_type(ct, false).unwrap();

        assert_eq!(
            registry.map_alias("身份證"),
            (PHIType::Custom, Some("TW_NATIONAL_ID".to_string()))
        );
    }

    #[test]
    fn register_custom_type_rejects_empty_name() {
        let registry = TypeRegistry::new();
        let ct = CustomPHIType {
            name: String::new(),
            description: "x".to_string(),
            pattern: None,
            examples: Vec::new(),
            regulation_source: None,
            is_high_risk: false,
            masking_strategy: None,
            aliases: Vec::new(),
        };
        assert!(registry.register_custom_type(ct, false).is_err());
    }

    #[test]
    fn record_discovered_type_is_idempotent_and_notifies_once() {
        let registry = TypeRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        registry.on_type_discovered(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.record_discovered_type("OCCUPATION", None);
        registry.record_discovered_type("OCCUPATION", None);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn type_enum_values_excludes_custom_and_other_meta_types() {
        let registry = TypeRegistry::new();
        let values = registry.type_enum_values();
        assert!(!values.contains(&"CUSTOM".to_string()));
        assert!(!values.contains(&"OTHER".to_string()));
        assert!(values.contains(&"NAME".to_string()));
    }

    #[test]
    fn prompt_rendering_lists_custom_with_prefix() {
        let registry = TypeRegistry::new();
        let ct = CustomPHIType::new("TW_NATIONAL_ID", "Taiwan National ID").unwrap();
        registry.register_custom_type(ct, false).unwrap();

        let text = registry.get_types_for_prompt(PromptFormat::List, true, true, true);
        assert!(text.contains("CUSTOM:TW_NATIONAL_ID"));
        assert!(text.contains("Standard PHI Types"));
    }
}
