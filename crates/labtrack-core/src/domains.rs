//! # Exam Domains
//!
//! Maps each study module to the exam domain it prepares for.
//!
//! A module id equals a catalog `lab_id` when the module has a hands-on
//! lab. `foundry` is the exception: it has no lab and contributes no steps.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BUILTIN: LazyLock<DomainMap> = LazyLock::new(|| DomainMap {
    modules: vec![
        LabModule::new("foundry", "Foundry Hub", "Plan & Manage", 1, "20-25%",
            "Azure resource management and planning"),
        LabModule::new("generative", "GenAI Lab", "Generative AI", 2, "15-20%",
            "Chat with AI models, prompt engineering, image generation"),
        LabModule::new("rag", "RAG Engine", "GenAI + Knowledge", 2, "15-20%",
            "Upload documents, search, ask questions grounded in data"),
        LabModule::new("agents", "Agent Workshop", "Agentic Solutions", 3, "5-10%",
            "Build and test AI agents"),
        LabModule::new("vision", "Vision Lab", "Computer Vision", 4, "10-15%",
            "Analyze images, OCR, object detection, custom classifiers"),
        LabModule::new("language", "Language & Speech", "NLP Solutions", 5, "15-20%",
            "Text analysis, translation, speech-to-text, text-to-speech"),
        LabModule::new("search", "Knowledge Mining", "Knowledge Mining", 6, "15-20%",
            "Search indexes, document extraction, skillsets"),
        LabModule::new("responsible-ai", "Responsible AI", "Cross-cutting", 1, "cross-cutting",
            "Content moderation, safety filters, prompt shields"),
    ],
    domains: vec![
        ExamDomain::new(1, "Plan and Manage an Azure AI Solution", "20-25%"),
        ExamDomain::new(2, "Implement Generative AI Solutions", "15-20%"),
        ExamDomain::new(3, "Implement an Agentic Solution", "5-10%"),
        ExamDomain::new(4, "Implement Computer Vision Solutions", "10-15%"),
        ExamDomain::new(5, "Implement NLP Solutions", "15-20%"),
        ExamDomain::new(6, "Knowledge Mining and Information Extraction", "15-20%"),
    ],
});

/// A study module shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabModule {
    pub id: String,
    pub name: String,
    /// Short domain label shown next to the module.
    pub area: String,
    pub domain: u8,
    pub weight: String,
    pub description: String,
}

impl LabModule {
    fn new(id: &str, name: &str, area: &str, domain: u8, weight: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            area: area.to_string(),
            domain,
            weight: weight.to_string(),
            description: description.to_string(),
        }
    }
}

/// One weighted section of the exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDomain {
    pub number: u8,
    pub name: String,
    /// Weight band, e.g. `20-25%`.
    pub weight: String,
}

impl ExamDomain {
    #[must_use]
    pub fn new(number: u8, name: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            weight: weight.into(),
        }
    }
}

/// Module-to-domain table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainMap {
    modules: Vec<LabModule>,
    domains: Vec<ExamDomain>,
}

impl DomainMap {
    /// The built-in module and domain table.
    #[must_use]
    pub fn builtin() -> &'static DomainMap {
        &BUILTIN
    }

    /// Build a table from explicit modules and domains.
    #[must_use]
    pub fn new(modules: Vec<LabModule>, domains: Vec<ExamDomain>) -> Self {
        Self { modules, domains }
    }

    /// Modules in display order.
    #[must_use]
    pub fn modules(&self) -> &[LabModule] {
        &self.modules
    }

    /// Exam domains in number order.
    #[must_use]
    pub fn domains(&self) -> &[ExamDomain] {
        &self.domains
    }

    #[must_use]
    pub fn module(&self, id: &str) -> Option<&LabModule> {
        self.modules.iter().find(|module| module.id == id)
    }

    #[must_use]
    pub fn domain(&self, number: u8) -> Option<&ExamDomain> {
        self.domains.iter().find(|domain| domain.number == number)
    }

    /// Domain number a module counts toward.
    #[must_use]
    pub fn domain_of(&self, module_id: &str) -> Option<u8> {
        self.module(module_id).map(|module| module.domain)
    }

    /// Ids of the modules mapped to `number`.
    pub fn modules_in_domain(&self, number: u8) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .filter(move |module| module.domain == number)
            .map(|module| module.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_mapping() {
        let map = DomainMap::builtin();
        assert_eq!(map.modules().len(), 8);
        assert_eq!(map.domains().len(), 6);
        assert_eq!(map.domain_of("rag"), Some(2));
        assert_eq!(map.domain_of("responsible-ai"), Some(1));
        assert_eq!(map.domain_of("quiz"), None);

        let domain_two: Vec<_> = map.modules_in_domain(2).collect();
        assert_eq!(domain_two, vec!["generative", "rag"]);
        assert_eq!(map.domain(3).map(|d| d.weight.as_str()), Some("5-10%"));
    }
}
