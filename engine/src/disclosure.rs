//! Row model for the Truth Layer disclosure.
//!
//! Identical for every content kind. Blank or missing fields produce no row.

use cue_types::present;
use cue_types::ui::{DisclosureState, TruthSection};
use cue_types::TruthLayer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureSection {
    pub section: TruthSection,
    pub expanded: bool,
    pub rows: Vec<DisclosureRow>,
}

struct Rows(Vec<DisclosureRow>);

impl Rows {
    fn text(&mut self, label: &'static str, value: Option<&str>) {
        if let Some(value) = present(value) {
            self.0.push(DisclosureRow {
                label,
                value: value.to_string(),
            });
        }
    }

    fn list<'a>(
        &mut self,
        label: &'static str,
        items: impl IntoIterator<Item = &'a String>,
        sep: &str,
    ) {
        let items: Vec<&str> = items
            .into_iter()
            .filter_map(|item| present(Some(item.as_str())))
            .collect();
        if !items.is_empty() {
            self.0.push(DisclosureRow {
                label,
                value: items.join(sep),
            });
        }
    }

    fn flag(&mut self, label: &'static str, value: bool) {
        self.0.push(DisclosureRow {
            label,
            value: if value { "yes" } else { "no" }.to_string(),
        });
    }
}

/// Rows for one section, in display order.
#[must_use]
pub fn section_rows(truth: &TruthLayer, section: TruthSection) -> Vec<DisclosureRow> {
    let mut rows = Rows(Vec::new());
    match section {
        TruthSection::Lineage => {
            let lineage = &truth.lineage;
            rows.list("People", &lineage.people, ", ");
            rows.text("Lens", lineage.lens.as_deref());
            rows.text("Framework", lineage.framework.as_deref());
        }
        TruthSection::Targeting => {
            let targeting = &truth.targeting;
            rows.text("Pillar", Some(targeting.pillar.as_str()));
            rows.text("Theme", targeting.theme.as_deref());
            rows.text("Schema", targeting.schema.as_deref());
            rows.text("Family", targeting.family.as_deref());
            rows.text("Concept", targeting.concept.as_deref());
            // BTreeSet iterates sorted.
            if let Some(also) = &targeting.also_helps {
                rows.list("Also helps", also, ", ");
            }
        }
        TruthSection::StateFit => {
            let fit = &truth.state_fit;
            rows.text("Best when", Some(fit.best_when.as_str()));
            rows.text("Not when", Some(fit.not_when.as_str()));
            rows.text("Arousal", fit.arousal_constraint.as_deref());
            if let Some(contraindications) = &fit.contraindications {
                rows.list("Contraindications", contraindications, "; ");
            }
        }
        TruthSection::ProofHooks => {
            let hooks = &truth.proof_hooks;
            rows.flag("Pre/post state", hooks.pre_post_state);
            rows.flag("Completion log", hooks.completion_log);
            rows.list("Reflections", &hooks.reflections, " / ");
            rows.text("Transfer test", hooks.transfer_test.as_deref());
        }
    }
    rows.0
}

/// All four sections with their accordion state applied.
#[must_use]
pub fn disclosure_view(truth: &TruthLayer, state: &DisclosureState) -> Vec<DisclosureSection> {
    TruthSection::ALL
        .iter()
        .map(|&section| DisclosureSection {
            section,
            expanded: state.is_expanded(section),
            rows: section_rows(truth, section),
        })
        .collect()
}
