//! Chemical system validation.

use crate::error::{SystemError, SystemResult};
use crate::phase::Phase;
use crate::system::CHARGE_ELEMENT;
use rk_thermo::Element;
use std::collections::HashSet;

pub(crate) fn validate_phases(phases: &[Phase]) -> SystemResult<()> {
    if phases.is_empty() {
        return Err(SystemError::InvalidSystem {
            what: "a chemical system needs at least one phase".into(),
        });
    }
    let mut phase_names = HashSet::new();
    let mut species_names = HashSet::new();
    for phase in phases {
        if phase.num_species() == 0 {
            return Err(SystemError::InvalidSystem {
                what: format!("phase {} has no species", phase.name()),
            });
        }
        if !phase_names.insert(phase.name()) {
            return Err(SystemError::InvalidSystem {
                what: format!("duplicate phase name {}", phase.name()),
            });
        }
        for s in phase.species() {
            if !species_names.insert(s.name()) {
                return Err(SystemError::InvalidSystem {
                    what: format!("duplicate species name {}", s.name()),
                });
            }
        }
    }
    Ok(())
}

/// Every species element (and charge, if any) must be a system element.
pub(crate) fn validate_elements(elements: &[Element], phases: &[Phase]) -> SystemResult<()> {
    let known: HashSet<&str> = elements.iter().map(Element::name).collect();
    for s in phases.iter().flat_map(|p| p.species()) {
        if let Some(missing) = s.elements().keys().find(|e| !known.contains(e.as_str())) {
            return Err(SystemError::InvalidSystem {
                what: format!("element {missing} of species {} is not a system element", s.name()),
            });
        }
        if s.charge() != 0.0 && !known.contains(CHARGE_ELEMENT) {
            return Err(SystemError::InvalidSystem {
                what: format!("charged species {} needs the {CHARGE_ELEMENT} element", s.name()),
            });
        }
    }
    Ok(())
}
