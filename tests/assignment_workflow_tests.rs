//! Assignment lifecycle through the workflow service

mod support;

use std::time::Duration;

use cim_domain_assignment::{
    ActivityKind, AggregateRoot, AssigneeProposal, AssignmentChanges, AssignmentDraft, AssignmentId,
    AssignmentState, ContentChange, ContentState, CoverageId, CoverageProvider, HistoryOperation,
    Notification,
    NewsCoverageStatus, PlanningId, PlanningSnapshot, UserId,
};
use pretty_assertions::assert_eq;
use support::{actor, Engine};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn create_on_desk_is_assigned_with_desk_stamp_only() {
    let engine = Engine::new();
    let desk = engine.desk("Politics", &[]).await;
    let editor = actor("editor");

    let created = assert_ok!(
        engine
            .workflow
            .create(
                AssignmentDraft::new(PlanningId::new(), CoverageId::new()).desk(desk),
                Some(&editor),
            )
            .await
    );

    assert_eq!(created.state(), AssignmentState::Assigned);
    assert!(created.assigned_to.assigned_date_desk.is_some());
    assert_eq!(created.assigned_to.assigned_date_user, None);
    assert_eq!(created.original_creator, Some(editor.id));
    assert_eq!(engine.notifier.event_names().await, vec!["assignments:created"]);
}

#[tokio::test]
async fn create_user_without_desk_persists_nothing() {
    let engine = Engine::new();

    let draft = AssignmentDraft::new(PlanningId::new(), CoverageId::new()).user(UserId::new());
    let err = assert_err!(engine.workflow.create(draft, None).await);

    assert!(err.is_validation_error());
    assert!(engine.store.is_empty().await);
    assert!(engine.notifier.published().await.is_empty());
}

#[tokio::test]
async fn reassigning_desk_restamps_desk_and_keeps_state() {
    let engine = Engine::new();
    let d1 = engine.desk("Politics", &[]).await;
    let d2 = engine.desk("Sports", &[]).await;
    let editor = actor("editor");

    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new()).desk(d1),
            None,
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let updated = engine
        .workflow
        .update(
            created.id,
            AssignmentChanges::reassign(AssigneeProposal::desk(d2)),
            Some(&editor),
        )
        .await
        .unwrap();

    assert_eq!(updated.state(), AssignmentState::Assigned);
    assert_eq!(updated.assigned_to.desk, Some(d2));
    assert_eq!(updated.assigned_to.assignor_desk, Some(editor.id));
    assert!(updated.assigned_to.assigned_date_desk > created.assigned_to.assigned_date_desk);
    assert_eq!(updated.version_creator, Some(editor.id));
    assert_eq!(updated.version(), 1);

    let history = engine.history.entries_for(created.id).await;
    let operations: Vec<_> = history.iter().map(|e| e.operation).collect();
    assert_eq!(operations, vec![HistoryOperation::Create, HistoryOperation::Reassigned]);

    match engine.notifier.published().await.last() {
        Some(Notification::AssignmentUpdated(notice)) => {
            assert_eq!(notice.original_assigned_desk, Some(d1));
            assert_eq!(notice.assigned_desk, Some(d2));
        }
        other => panic!("expected an update notification, got {other:?}"),
    }
}

#[tokio::test]
async fn resubmitting_identical_assignee_does_not_touch_stamps() {
    let engine = Engine::new();
    let desk = engine.desk("Politics", &[]).await;
    let user = UserId::new();

    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new())
                .desk(desk)
                .user(user),
            None,
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let updated = engine
        .workflow
        .update(
            created.id,
            AssignmentChanges::reassign(AssigneeProposal::user(desk, user)),
            Some(&actor("someone else")),
        )
        .await
        .unwrap();

    assert_eq!(updated.assigned_to, created.assigned_to);
    assert_eq!(engine.activity.activities().await.len(), 1);
}

#[tokio::test]
async fn cancelling_desk_assignment_notifies_members_and_refreshes_planning() {
    let engine = Engine::new();
    let members = [UserId::new(), UserId::new()];
    let desk = engine.desk("Sports", &members).await;
    let planning_id = PlanningId::new();
    let coverage_id = CoverageId::new();
    let chief = actor("chief");

    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(planning_id, coverage_id)
                .desk(desk)
                .planning(PlanningSnapshot {
                    slugline: Some("derby".to_string()),
                    ..Default::default()
                }),
            None,
        )
        .await
        .unwrap();

    let live = PlanningSnapshot {
        slugline: Some("derby postponed".to_string()),
        news_coverage_status: Some(NewsCoverageStatus {
            qcode: "ncostat:notint".to_string(),
            name: Some("coverage not intended".to_string()),
        }),
        ..Default::default()
    };
    engine
        .planning
        .set_coverage(planning_id, coverage_id, live.clone())
        .await;

    let cancelled = engine
        .workflow
        .cancel(created.id, Some(&chief))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(cancelled.state(), AssignmentState::Cancelled);
    assert_eq!(cancelled.assigned_to.desk, Some(desk));
    assert_eq!(cancelled.planning, live);

    let activities = engine.activity.activities().await;
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].kind, ActivityKind::Cancelled);
    assert_eq!(activities[0].notify, members.to_vec());
    assert_eq!(
        activities[0].render(),
        "Assignment derby postponed for desk Sports has been cancelled by chief"
    );
}

#[tokio::test]
async fn cancelling_user_assignment_notifies_only_the_user() {
    let engine = Engine::new();
    let user = UserId::new();
    let desk = engine.desk("Sports", &[UserId::new(), user]).await;

    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new())
                .desk(desk)
                .user(user),
            None,
        )
        .await
        .unwrap();

    engine.workflow.cancel(created.id, None).await.unwrap();

    let activities = engine.activity.activities().await;
    let cancellation = activities
        .iter()
        .find(|a| a.kind == ActivityKind::Cancelled)
        .unwrap();
    assert_eq!(cancellation.notify, vec![user]);
}

#[tokio::test]
async fn cancelling_provider_assignment_notifies_the_desk() {
    let engine = Engine::new();
    let members = vec![UserId::new(), UserId::new()];
    let desk = engine.desk("Photo", &members).await;
    let provider = CoverageProvider {
        qcode: "stringer".to_string(),
        name: "Stringer".to_string(),
    };

    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new())
                .assignee(AssigneeProposal::provider(Some(desk), provider)),
            None,
        )
        .await
        .unwrap();
    engine.workflow.cancel(created.id, None).await.unwrap();

    let activities = engine.activity.activities().await;
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].kind, ActivityKind::Cancelled);
    assert_eq!(activities[0].notify, members);
}

#[tokio::test]
async fn cancelling_unknown_assignment_does_nothing() {
    let engine = Engine::new();
    let result = assert_ok!(
        engine
            .workflow
            .cancel(AssignmentId::new(), None)
            .await
    );
    assert!(result.is_none());
    assert!(engine.notifier.published().await.is_empty());
}

#[tokio::test]
async fn publishing_linked_content_completes_assignment_once() {
    let engine = Engine::new();
    let desk = engine.desk("Politics", &[]).await;
    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new()).desk(desk),
            None,
        )
        .await
        .unwrap();

    let mut item = engine.item(ContentState::Published, Some(desk)).await;
    item.assignment_id = Some(created.id);
    let change = ContentChange {
        state: Some(ContentState::Published),
        ..Default::default()
    };

    let completed = engine
        .workflow
        .on_content_publish(&change, &item, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.state(), AssignmentState::Completed);

    let again = engine
        .workflow
        .on_content_publish(&change, &item, None)
        .await
        .unwrap();
    assert!(again.is_none());
    let stored = engine.workflow.find(created.id).await.unwrap().unwrap();
    assert_eq!(stored.state(), AssignmentState::Completed);
}

#[tokio::test]
async fn publishing_content_of_cancelled_assignment_completes_it() {
    let engine = Engine::new();
    let desk = engine.desk("Politics", &[]).await;
    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new()).desk(desk),
            None,
        )
        .await
        .unwrap();
    engine.workflow.cancel(created.id, None).await.unwrap();

    let mut item = engine.item(ContentState::Published, Some(desk)).await;
    item.assignment_id = Some(created.id);
    let change = ContentChange {
        state: Some(ContentState::Published),
        ..Default::default()
    };

    let completed = engine
        .workflow
        .on_content_publish(&change, &item, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.state(), AssignmentState::Completed);
}

#[tokio::test]
async fn lock_change_after_publish_moves_user_and_keeps_completed() {
    let engine = Engine::new();
    let desk = engine.desk("Politics", &[]).await;
    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new())
                .desk(desk)
                .user(UserId::new()),
            None,
        )
        .await
        .unwrap();

    let mut item = engine.item(ContentState::Published, Some(desk)).await;
    item.assignment_id = Some(created.id);
    engine
        .workflow
        .on_content_publish(&ContentChange::default(), &item, None)
        .await
        .unwrap();

    let editor = UserId::new();
    let change = ContentChange {
        lock_user: Some(editor),
        ..Default::default()
    };
    let updated = engine
        .workflow
        .on_content_lock_change(&change, &item, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.state(), AssignmentState::Completed);
    assert!(updated.assigned_to.user.unwrap().is_user(&editor));
}

#[tokio::test]
async fn moving_linked_content_submits_assignment_to_new_desk() {
    let engine = Engine::new();
    let home = engine.desk("Politics", &[]).await;
    let review = engine.desk("Copy", &[]).await;
    let reporter = UserId::new();
    let mover = actor("producer");

    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new())
                .desk(home)
                .user(reporter),
            None,
        )
        .await
        .unwrap();

    let mut item = engine.item(ContentState::InProgress, Some(home)).await;
    item.assignment_id = Some(created.id);
    let change = ContentChange {
        desk: Some(review),
        ..Default::default()
    };

    let submitted = engine
        .workflow
        .on_content_desk_move(&change, &item, Some(&mover))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(submitted.state(), AssignmentState::Submitted);
    assert_eq!(submitted.assigned_to.desk, Some(review));
    assert_eq!(submitted.assigned_to.user, None);
    assert_eq!(submitted.assigned_to.assignor_user, Some(mover.id));
}

#[tokio::test]
async fn lock_by_other_editor_moves_user_only() {
    let engine = Engine::new();
    let desk = engine.desk("Politics", &[]).await;
    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new())
                .desk(desk)
                .user(UserId::new()),
            None,
        )
        .await
        .unwrap();

    let mut item = engine.item(ContentState::InProgress, Some(desk)).await;
    item.assignment_id = Some(created.id);
    let editor = UserId::new();
    let change = ContentChange {
        lock_user: Some(editor),
        ..Default::default()
    };

    let updated = engine
        .workflow
        .on_content_lock_change(&change, &item, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.state(), created.state());
    assert_eq!(updated.assigned_to.desk, Some(desk));
    assert!(updated.assigned_to.user.unwrap().is_user(&editor));
}

#[tokio::test]
async fn availability_can_be_confirmed_and_reverted() {
    let engine = Engine::new();
    let desk = engine.desk("Photo", &[]).await;
    let created = engine
        .workflow
        .create(
            AssignmentDraft::new(PlanningId::new(), CoverageId::new()).desk(desk),
            None,
        )
        .await
        .unwrap();

    let confirmed = engine
        .workflow
        .confirm_availability(created.id, None)
        .await
        .unwrap();
    assert_eq!(confirmed.state(), AssignmentState::Completed);
    assert!(!confirmed.can_edit());

    let reverted = engine
        .workflow
        .revert_availability(created.id, None)
        .await
        .unwrap();
    assert_eq!(reverted.state(), AssignmentState::Assigned);

    let operations: Vec<_> = engine
        .history
        .entries_for(created.id)
        .await
        .into_iter()
        .map(|e| e.operation)
        .collect();
    assert_eq!(
        operations,
        vec![
            HistoryOperation::Create,
            HistoryOperation::Confirm,
            HistoryOperation::Revert
        ]
    );
}
