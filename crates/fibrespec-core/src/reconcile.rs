use crate::model::SpecificationRecord;
use crate::registry::ParameterRegistry;
use tracing::debug;

/// A parameter filed under the wrong section.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Move {
    from: String,
    to: String,
    parameter: String,
}

/// Re-file every parameter under the section the registry assigns it.
///
/// Moves are collected first and applied after the scan. A moved parameter is
/// only inserted when the target section does not already hold the name; the
/// stale copy is dropped either way. Returns the number of parameters moved
/// out of a section.
pub fn reconcile(record: &mut SpecificationRecord, registry: &ParameterRegistry) -> usize {
    let mut moves = Vec::new();
    for (section, params) in &record.sections {
        for parameter in params.keys() {
            let correct = registry.categorize_parameter(parameter);
            if correct != *section {
                moves.push(Move {
                    from: section.clone(),
                    to: correct,
                    parameter: parameter.clone(),
                });
            }
        }
    }

    for m in &moves {
        let Some(value) = record.remove(&m.from, &m.parameter) else {
            continue;
        };
        let target = record.section_mut(&m.to);
        if target.contains_key(&m.parameter) {
            debug!(parameter = %m.parameter, from = %m.from, to = %m.to, "dropped duplicate during reconciliation");
        } else {
            target.insert(m.parameter.clone(), value);
            debug!(parameter = %m.parameter, from = %m.from, to = %m.to, "moved parameter");
        }
    }

    record.sections.retain(|_, params| !params.is_empty());
    moves.len()
}
