//! Conserved transfers between integrated variables.
//!
//! A [`Flow`] moves its rate out of one `var` and into another, so whatever
//! the flow describes (people, money, carbon) is conserved by construction:
//! every contribution enters `dvar` twice with opposite signs.

use crate::errors::{StockflowError, StockflowResult};
use crate::state::NamedState;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// A conserved transfer between two integrated variables.
///
/// `rate` names the value giving the flow magnitude; where it is resolved
/// depends on which flow list the flow is declared in (`aux_var_flows`
/// resolve in `aux_var`, falling back to `var`; `param_flows` resolve in
/// `param`). Read-only after declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub from: String,
    pub to: String,
    pub rate: String,
}

impl Flow {
    pub fn new(from: &str, to: &str, rate: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            rate: rate.to_string(),
        }
    }
}

fn resolve_rate(
    flow: &Flow,
    magnitudes: &NamedState,
    fallback: Option<&NamedState>,
) -> StockflowResult<FloatValue> {
    if magnitudes.contains(&flow.rate) {
        return magnitudes.get(&flow.rate);
    }
    if let Some(fallback) = fallback {
        if fallback.contains(&flow.rate) {
            return fallback.get(&flow.rate);
        }
    }
    Err(StockflowError::UnknownFlowRate {
        key: flow.rate.clone(),
    })
}

/// Apply each flow's rate to the derivative container: subtracted from
/// `from`, added to `to`.
///
/// `dvar` must already hold an entry for every variable participating in a
/// flow; contributions are summed into whatever is there, so this composes
/// with non-flow derivative terms in either order. Variables not named by
/// any flow are untouched. Plain double-precision arithmetic, no clamping.
pub fn apply_flows(
    flows: &[Flow],
    magnitudes: &NamedState,
    fallback: Option<&NamedState>,
    dvar: &mut NamedState,
) -> StockflowResult<()> {
    for flow in flows {
        let rate = resolve_rate(flow, magnitudes, fallback)?;
        dvar.add(&flow.from, -rate)
            .map_err(|_| StockflowError::UnknownFlowEndpoint {
                key: flow.from.clone(),
            })?;
        dvar.add(&flow.to, rate)
            .map_err(|_| StockflowError::UnknownFlowEndpoint {
                key: flow.to.clone(),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed_dvar() -> NamedState {
        let mut dvar = NamedState::new("dvar");
        dvar.zero_all(&["a".to_string(), "b".to_string(), "c".to_string()]);
        dvar
    }

    #[test]
    fn single_flow_is_conserved() {
        let mut aux_var = NamedState::new("aux_var");
        aux_var.set("rate", 5.0);
        let mut dvar = zeroed_dvar();

        let flows = vec![Flow::new("a", "b", "rate")];
        apply_flows(&flows, &aux_var, None, &mut dvar).unwrap();

        assert_eq!(dvar.get("a").unwrap(), -5.0);
        assert_eq!(dvar.get("b").unwrap(), 5.0);
        assert_eq!(dvar.get("a").unwrap() + dvar.get("b").unwrap(), 0.0);
        // uninvolved variables keep their previous value
        assert_eq!(dvar.get("c").unwrap(), 0.0);
    }

    #[test]
    fn contributions_sum_with_existing_terms() {
        let mut aux_var = NamedState::new("aux_var");
        aux_var.set("rate", 2.0);
        let mut dvar = zeroed_dvar();
        dvar.set("a", 1.0);

        let flows = vec![Flow::new("a", "b", "rate")];
        apply_flows(&flows, &aux_var, None, &mut dvar).unwrap();

        assert_eq!(dvar.get("a").unwrap(), -1.0);
        assert_eq!(dvar.get("b").unwrap(), 2.0);
    }

    #[test]
    fn rate_falls_back_to_var() {
        let aux_var = NamedState::new("aux_var");
        let mut var = NamedState::new("var");
        var.set("rate", 3.0);
        let mut dvar = zeroed_dvar();

        let flows = vec![Flow::new("a", "b", "rate")];
        apply_flows(&flows, &aux_var, Some(&var), &mut dvar).unwrap();

        assert_eq!(dvar.get("b").unwrap(), 3.0);
    }

    #[test]
    fn unresolvable_rate_is_an_error() {
        let aux_var = NamedState::new("aux_var");
        let mut dvar = zeroed_dvar();

        let flows = vec![Flow::new("a", "b", "rate")];
        let result = apply_flows(&flows, &aux_var, None, &mut dvar);
        assert!(matches!(
            result,
            Err(StockflowError::UnknownFlowRate { .. })
        ));
    }

    #[test]
    fn undeclared_endpoint_is_an_error() {
        let mut aux_var = NamedState::new("aux_var");
        aux_var.set("rate", 1.0);
        let mut dvar = zeroed_dvar();

        let flows = vec![Flow::new("a", "z", "rate")];
        let result = apply_flows(&flows, &aux_var, None, &mut dvar);
        assert!(matches!(
            result,
            Err(StockflowError::UnknownFlowEndpoint { .. })
        ));
    }
}
