//! End-to-end S4: a 2-D navigator blueprint whose laws carve a
//! rectangle and a circle out of a bounded arena. A straight-line
//! proposal through the obstacle is rejected; a detour around it
//! commits, and `move_along` updates the navigator's position fields.

use newton_core::field::FieldValue;
use newton_core::geometry::ControlPoints;
use newton_core::law::Law;
use newton_core::ledger::Ledger;
use newton_core::vector::StateVector;
use newton_core::{BlueprintBuilder, ForgeAction, Verdict};
use std::sync::Arc;

fn navigator(ledger: Arc<Ledger>) -> newton_core::Blueprint {
    BlueprintBuilder::new("Navigator")
        .field("x", FieldValue::Double(1.0))
        .unwrap()
        .field("y", FieldValue::Double(1.0))
        .unwrap()
        .law(Law::new("within bounds", |s: &StateVector| {
            s[0] >= 0.0 && s[0] <= 10.0 && s[1] >= 0.0 && s[1] <= 6.0
        }))
        .law(Law::new("avoids rectangle", |s: &StateVector| {
            !(s[0] >= 2.0 && s[0] <= 4.0 && s[1] >= 1.0 && s[1] <= 3.0)
        }))
        .law(Law::new("avoids circle", |s: &StateVector| {
            (s[0] - 7.0).powi(2) + (s[1] - 4.0).powi(2) > 1.0
        }))
        .forge("move_to", |fields| {
            fields.write("x", FieldValue::Double(9.0));
            fields.write("y", FieldValue::Double(5.0));
            vec![ForgeAction::Commit]
        })
        .unwrap()
        .build(ledger)
}

#[test]
fn straight_line_forge_is_rejected_by_the_obstacle() {
    let ledger = Arc::new(Ledger::new());
    let mut nav = navigator(ledger.clone());

    let verdict = nav.forge("move_to");
    assert!(verdict.is_reject());
    assert_eq!(nav.field_value("x"), Some(&FieldValue::Double(1.0)));
    assert_eq!(nav.field_value("y"), Some(&FieldValue::Double(1.0)));
    assert_eq!(ledger.rejections().len(), 1);
}

#[test]
fn move_along_a_curved_detour_commits_and_updates_position() {
    let ledger = Arc::new(Ledger::new());
    let mut nav = navigator(ledger.clone());

    let detour = ControlPoints::new(
        StateVector::new(vec![1.0, 1.0]),
        StateVector::new(vec![2.0, 4.5]),
        StateVector::new(vec![6.0, 5.5]),
        StateVector::new(vec![9.0, 5.0]),
    )
    .unwrap();

    let verdict = nav.move_along(detour, &["x", "y"]);
    assert_eq!(verdict, Verdict::Commit);
    assert_eq!(nav.field_value("x"), Some(&FieldValue::Double(9.0)));
    assert_eq!(nav.field_value("y"), Some(&FieldValue::Double(5.0)));
    assert_eq!(ledger.commits().len(), 1);
}

#[test]
fn straight_line_through_the_rectangle_still_rejects_as_free_form_geometry() {
    let ledger = Arc::new(Ledger::new());
    let mut nav = navigator(ledger.clone());

    let straight = ControlPoints::linear(
        &StateVector::new(vec![1.0, 1.0]),
        &StateVector::new(vec![9.0, 5.0]),
    )
    .unwrap();

    let verdict = nav.move_along(straight, &["x", "y"]);
    assert!(verdict.is_reject());
    assert_eq!(nav.field_value("x"), Some(&FieldValue::Double(1.0)));
}
