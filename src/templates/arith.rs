//! Safe integer division templates.
//!
//! Every div/rem template has the same shape:
//!
//! ```text
//! zero  = const 0
//! cond  = eq y, zero
//! guard = guard(DivisionByZero) cond
//! res   = safe op x, y, guard
//! ```
//!
//! The comparison only tests for equality with zero, so it reads the same for
//! signed and unsigned operations. Signedness lives in the safe node itself.

use super::{Template, TemplateInput, TemplateKey, TemplateNode, TemplateOp};
use crate::constant::Constant;
use crate::fallback::FallbackReason;
use crate::stamp::{IntegerStamp, Stamp};

/// Slot names of the div/rem templates: dividend, divisor.
pub const DIV_REM_SLOTS: &[&str] = &["x", "y"];

const X: TemplateInput = TemplateInput::Slot(0);
const Y: TemplateInput = TemplateInput::Slot(1);

/// Build the template for `key.op` at `key.width` bits.
pub fn build_div_rem_template(key: TemplateKey) -> Template {
    let width = key.width;
    let nodes = vec![
        TemplateNode {
            op: TemplateOp::Constant(Constant::int(width, 0)),
            stamp: Stamp::int_constant(width, 0),
            inputs: Vec::new(),
        },
        TemplateNode {
            op: TemplateOp::IntegerEquals,
            stamp: Stamp::Integer(IntegerStamp::new(32, 0, 1)),
            inputs: vec![Y, TemplateInput::Node(0)],
        },
        TemplateNode {
            op: TemplateOp::Fallback(FallbackReason::DivisionByZero),
            stamp: Stamp::Void,
            inputs: vec![TemplateInput::Node(1)],
        },
        TemplateNode {
            op: TemplateOp::SafeDivRem(key.op),
            stamp: Stamp::int(width),
            inputs: vec![X, Y, TemplateInput::Node(2)],
        },
    ];
    Template::new(key, DIV_REM_SLOTS, nodes, 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DivRemOp;

    #[test]
    fn test_zero_check_precedes_divide() {
        for op in DivRemOp::ALL {
            for width in [32, 64] {
                let template = build_div_rem_template(TemplateKey::new(op, width));
                let nodes = template.nodes();
                assert_eq!(nodes[0].op, TemplateOp::Constant(Constant::int(width, 0)));
                assert_eq!(nodes[2].op, TemplateOp::Fallback(FallbackReason::DivisionByZero));
                assert_eq!(template.result().op, TemplateOp::SafeDivRem(op));
                assert_eq!(template.result().stamp.bits(), Some(width));
                assert!(template.result().inputs.contains(&TemplateInput::Node(2)));
            }
        }
    }

    #[test]
    fn test_slots() {
        let template = build_div_rem_template(TemplateKey::new(DivRemOp::UnsignedDiv, 64));
        assert_eq!(template.slots(), &["x", "y"]);
        assert_eq!(template.key().to_string(), "udiv_i64");
    }
}
