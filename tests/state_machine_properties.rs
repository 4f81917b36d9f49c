//! Idempotence properties of the pure transition decisions

use chrono::{Duration, TimeZone, Utc};
use cim_domain_assignment::{
    AssignedTo, AssigneeProposal, AssignmentState, AssignmentStateMachine, ContentItemId,
    ContentState, DeskId, UserId,
};
use proptest::prelude::*;

fn any_state() -> impl Strategy<Value = AssignmentState> {
    prop::sample::select(AssignmentState::ALL.to_vec())
}

fn any_content_state() -> impl Strategy<Value = ContentState> {
    prop::sample::select(vec![
        ContentState::Draft,
        ContentState::InProgress,
        ContentState::Submitted,
        ContentState::Scheduled,
        ContentState::Published,
        ContentState::Corrected,
    ])
}

prop_compose! {
    fn any_assigned_to()(
        state in any_state(),
        with_user in any::<bool>(),
        age_minutes in 1i64..10_000,
    ) -> AssignedTo {
        let stamped = Utc.timestamp_opt(1_700_000_000, 0).unwrap()
            - Duration::minutes(age_minutes);
        AssignedTo {
            desk: Some(DeskId::new()),
            user: with_user.then(|| UserId::new().into()),
            assignor_desk: Some(UserId::new()),
            assigned_date_desk: Some(stamped),
            assigned_date_user: with_user.then_some(stamped),
            state,
            ..Default::default()
        }
    }
}

proptest! {
    #[test]
    fn resubmitting_the_same_assignee_changes_nothing(original in any_assigned_to()) {
        let proposal = AssigneeProposal {
            desk: original.desk,
            user: original.user.clone(),
            coverage_provider: original.coverage_provider.clone(),
            state: None,
        };

        let next = AssignmentStateMachine::reassign(&original, &proposal, Some(UserId::new()), Utc::now());
        prop_assert_eq!(next.unwrap().assigned_to, original);
    }

    #[test]
    fn publish_is_idempotent(original in any_assigned_to()) {
        if let Some(first) = AssignmentStateMachine::on_publish(&original) {
            prop_assert_eq!(first.to, AssignmentState::Completed);
            prop_assert!(AssignmentStateMachine::on_publish(&first.assigned_to).is_none());
        } else {
            prop_assert_eq!(original.state, AssignmentState::Completed);
        }
    }

    #[test]
    fn linking_never_leaves_completed(
        original in any_assigned_to(),
        content in any_content_state(),
    ) {
        let completed = AssignedTo { state: AssignmentState::Completed, ..original };
        let next = AssignmentStateMachine::on_content_linked(
            &completed,
            content,
            &[ContentItemId::new()],
            None,
            Utc::now(),
        );
        prop_assert!(next.is_none());
    }

    #[test]
    fn decisions_respect_the_state_graph(
        original in any_assigned_to(),
        content in any_content_state(),
    ) {
        let decisions = [
            AssignmentStateMachine::on_publish(&original),
            AssignmentStateMachine::on_cancel(&original),
            AssignmentStateMachine::on_desk_move(&original, DeskId::new(), None, Utc::now()),
            AssignmentStateMachine::on_lock_change(&original, UserId::new(), Utc::now()),
            AssignmentStateMachine::on_content_linked(&original, content, &[], None, Utc::now()),
        ];
        for transition in decisions.into_iter().flatten() {
            prop_assert!(original.state.can_transition_to(transition.to));
        }
    }
}
