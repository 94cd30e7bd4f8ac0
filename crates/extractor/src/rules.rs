use serde::{Deserialize, Serialize};

/// Which rule set a modality selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalityClass {
    Biologic,
    SmallMolecule,
}

impl ModalityClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Biologic => "biologic",
            Self::SmallMolecule => "small_molecule",
        }
    }
}

/// One keyword rule: if any keyword occurs in a lower-cased window, emit
/// `(cqa, test_methods)` once for that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRule {
    pub class: ModalityClass,
    pub keywords: &'static [&'static str],
    pub cqa: &'static str,
    pub test_methods: &'static str,
}

impl KeywordRule {
    /// `window` must already be lower-cased.
    pub fn matches(&self, window: &str) -> bool {
        self.keywords.iter().any(|keyword| window.contains(keyword))
    }
}

const fn rule(
    class: ModalityClass,
    keywords: &'static [&'static str],
    cqa: &'static str,
    test_methods: &'static str,
) -> KeywordRule {
    KeywordRule {
        class,
        keywords,
        cqa,
        test_methods,
    }
}

use ModalityClass::{Biologic, SmallMolecule};

/// Ordered rule table. Order within a class is the emission order within a window.
pub static RULES: &[KeywordRule] = &[
    rule(Biologic, &["purity"], "Purity", "HPLC, SEC"),
    rule(Biologic, &["potency"], "Potency", "Bioassay, Cell-based Assay"),
    rule(Biologic, &["identity"], "Identity", "Peptide Mapping"),
    rule(Biologic, &["glycosylation"], "Glycosylation", "UPLC-MS"),
    rule(Biologic, &["charge variant", "icief"], "Charge Variants", "iCIEF"),
    rule(Biologic, &["aggregation", "aggregate"], "Aggregates", "SEC-HPLC"),
    rule(Biologic, &["oxidation"], "Oxidation", "Peptide Mapping"),
    rule(SmallMolecule, &["identity"], "Identity", "HPLC RT, Mass Spec"),
    rule(SmallMolecule, &["purity"], "Purity", "HPLC, CE"),
    rule(SmallMolecule, &["potency"], "Potency", "Bioassay"),
    rule(SmallMolecule, &["residual solvent"], "Residual Solvents", "GC"),
    rule(SmallMolecule, &["heavy metal"], "Heavy Metals", "ICP-MS"),
    rule(SmallMolecule, &["degradation"], "Degradation Products", "Stability HPLC"),
    rule(SmallMolecule, &["moisture"], "Moisture Content", "Karl Fischer"),
    rule(SmallMolecule, &["content uniformity"], "Content Uniformity", "HPLC Assay"),
    rule(SmallMolecule, &["polymorph"], "Polymorphic Forms", "XRPD"),
];

/// Rules for one class, in table order.
pub fn rules_for(class: ModalityClass) -> impl Iterator<Item = &'static KeywordRule> {
    RULES.iter().filter(move |rule| rule.class == class)
}
