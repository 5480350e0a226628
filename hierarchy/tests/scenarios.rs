//! End-to-end editor scenarios

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use hierarchy::{
    Address, Banner, Engine, EngineConfig, FieldName, FormEvent, FormPhase, Gender, GateIssue,
    GateState, MaritalStatus, MemberDraft, MemberForm, MemberModule, MemberRole, MinistryBlock,
    MinistryCategory, MinistryRole, PersonalData, Profile, PromotionState, RelationType,
    StructureData,
};

fn address() -> Address {
    Address {
        country: Some("Peru".to_string()),
        department: Some("Lima".to_string()),
        province: Some("Lima".to_string()),
        district: Some("Comas".to_string()),
        urban_sector: Some("La Libertad".to_string()),
        address: Some("Av. Belaunde 455".to_string()),
        reference_place: Some("Across from the park".to_string()),
    }
}

fn person() -> Profile {
    Profile::Person(PersonalData {
        first_names: Some("Jose Luis".to_string()),
        last_names: Some("Huaman Torres".to_string()),
        gender: Some(Gender::Male),
        origin_country: Some("Peru".to_string()),
        birth_date: NaiveDate::from_ymd_opt(1979, 11, 3),
        marital_status: Some(MaritalStatus::Single),
        number_of_children: Some(0),
        conversion_date: NaiveDate::from_ymd_opt(2001, 6, 17),
        email: Some("jose@example.org".to_string()),
        phone_number: None,
        residence: address(),
    })
}

fn zone(name: Option<&str>) -> Profile {
    Profile::Zone(StructureData {
        name: name.map(str::to_string),
        service_time: None,
        location: address(),
    })
}

fn engine() -> Arc<Engine> {
    Arc::new(Engine::with_defaults())
}

fn select(field: FieldName, id: &str) -> FormEvent {
    FormEvent::SelectUpstream {
        field,
        id: Some(id.to_string()),
    }
}

#[test]
fn test_preacher_promoted_to_supervisor() {
    let now = Instant::now();
    let draft = MemberDraft::new(MemberModule::Preacher, person())
        .with_upstream(FieldName::TheirSupervisor, "sup-1");
    let mut form = MemberForm::edit(engine(), "pre-7", draft).unwrap();

    let view = form.view().unwrap();
    assert_eq!(view.promotion, PromotionState::NotEligible);
    assert!(view.flags.is_message_promote_disabled);

    // Qualifying action
    form.apply(FormEvent::MarkPromotionCandidate(true), now).unwrap();
    let view = form.view().unwrap();
    assert!(view.promotion.is_eligible());
    assert!(!view.flags.is_message_promote_disabled);

    form.apply(FormEvent::Promote { direct_to_pastor: false }, now)
        .unwrap();
    let view = form.view().unwrap();
    assert_eq!(view.phase, FormPhase::AwaitingPromotionRelation);
    assert!(view.flags.is_input_disabled);
    assert!(!view.flags.is_relation_select_disabled);
    assert!(!view.flags.is_direct_pastor_checkbox_disabled);
    assert_eq!(view.fields.required, vec![FieldName::TheirCopastor]);
    assert!(view.flags.is_submit_button_disabled);
    assert_eq!(
        view.gate.issues,
        vec![GateIssue::MissingUpstream {
            field: FieldName::TheirCopastor
        }]
    );

    // Personal inputs stay frozen while the new relation is chosen
    let result = form.apply(FormEvent::ToggleRole(MemberRole::Treasurer), now);
    assert!(result.is_err());

    form.apply(select(FieldName::TheirCopastor, "cop-9"), now)
        .unwrap();
    let view = form.view().unwrap();
    assert_eq!(view.phase, FormPhase::Promoted);
    assert_eq!(view.gate.banner, Banner::Success);
    assert!(!view.flags.is_submit_button_disabled);

    let request = form.begin_submit().unwrap();
    assert_eq!(request.record_id.as_deref(), Some("pre-7"));
    let payload = request.payload;
    assert_eq!(payload.module, MemberModule::Supervisor);
    assert!(payload.roles.contains(&MemberRole::Preacher));
    assert!(payload.roles.contains(&MemberRole::Supervisor));
    assert_eq!(payload.upstream(FieldName::TheirCopastor), Some("cop-9"));
    assert_eq!(payload.upstream(FieldName::TheirSupervisor), None);

    form.submit_succeeded("pre-7").unwrap();
    assert_eq!(form.phase(), FormPhase::Saved);
    assert_eq!(form.view().unwrap().promotion, PromotionState::NotEligible);
}

#[test]
fn test_promotion_failure_keeps_promoted_state() {
    let now = Instant::now();
    let draft = MemberDraft::new(MemberModule::Preacher, person())
        .with_upstream(FieldName::TheirSupervisor, "sup-1");
    let mut form = MemberForm::edit(engine(), "pre-7", draft).unwrap();
    form.apply(FormEvent::MarkPromotionCandidate(true), now).unwrap();
    form.apply(FormEvent::Promote { direct_to_pastor: false }, now)
        .unwrap();
    form.apply(select(FieldName::TheirCopastor, "cop-9"), now)
        .unwrap();

    form.begin_submit().unwrap();
    form.submit_failed("timeout").unwrap();

    let view = form.view().unwrap();
    assert_eq!(view.phase, FormPhase::Promoted);
    assert!(!view.flags.is_submit_button_disabled);
    assert!(form.begin_submit().is_ok());
}

#[test]
fn test_zone_supervisor_change_confirmed() {
    let start = Instant::now();
    let draft = MemberDraft::new(MemberModule::Zone, zone(None))
        .with_upstream(FieldName::TheirSupervisor, "sup-1")
        .with_upstream(FieldName::TheirCopastor, "cop-1");
    let mut form = MemberForm::edit(engine(), "zone-3", draft).unwrap();

    form.apply(select(FieldName::TheirSupervisor, "sup-2"), start)
        .unwrap();
    assert!(!form.tick(start + Duration::from_millis(100)));
    assert!(form.tick(start + Duration::from_millis(300)));

    let view = form.view().unwrap();
    assert!(view.flags.is_confirmation_dialog_open);
    let confirmation = view.confirmation.unwrap();
    assert_eq!(confirmation.last_known.as_deref(), Some("sup-1"));
    assert_eq!(confirmation.candidate.as_deref(), Some("sup-2"));

    form.apply(FormEvent::ConfirmRelationChange, start + Duration::from_millis(500))
        .unwrap();
    let view = form.view().unwrap();
    assert!(!view.flags.is_confirmation_dialog_open);
    assert_eq!(
        form.draft()
            .upstream
            .get(&FieldName::TheirSupervisor)
            .map(String::as_str),
        Some("sup-2")
    );

    // Zone name still missing
    assert_eq!(view.gate.state, GateState::Incomplete);
    assert!(view.flags.is_submit_button_disabled);

    form.apply(FormEvent::SetProfile(zone(Some("Zone North"))), start)
        .unwrap();
    let view = form.view().unwrap();
    assert_eq!(view.gate.state, GateState::Complete);
    assert!(!view.flags.is_submit_button_disabled);

    let request = form.begin_submit().unwrap();
    assert_eq!(
        request.payload.upstream(FieldName::TheirSupervisor),
        Some("sup-2")
    );
    assert_eq!(
        request.payload.upstream(FieldName::TheirCopastor),
        Some("cop-1")
    );
}

#[test]
fn test_reverting_leader_leaves_no_open_dialog() {
    let start = Instant::now();
    let draft = MemberDraft::new(MemberModule::Zone, zone(Some("Zone North")))
        .with_upstream(FieldName::TheirSupervisor, "sup-1");
    let mut form = MemberForm::edit(engine(), "zone-3", draft).unwrap();

    form.apply(select(FieldName::TheirSupervisor, "sup-2"), start)
        .unwrap();
    form.apply(
        select(FieldName::TheirSupervisor, "sup-1"),
        start + Duration::from_millis(100),
    )
    .unwrap();

    assert!(!form.tick(start + Duration::from_secs(2)));
    let confirmation = form.view().unwrap().confirmation.unwrap();
    assert_eq!(confirmation.last_known.as_deref(), Some("sup-1"));
    assert_eq!(confirmation.candidate, None);
    assert!(form.view().unwrap().gate.is_complete());
}

#[test]
fn test_relation_switch_resets_blocks_idempotently() {
    let now = Instant::now();
    let draft = MemberDraft::new(MemberModule::Disciple, person())
        .with_relation_type(RelationType::OnlyRelatedMinistries)
        .with_upstream(FieldName::TheirPastorOnlyMinistries, "pas-1")
        .with_ministry_blocks(vec![MinistryBlock::assigned(
            "church-1",
            MinistryCategory::Kids,
            "min-4",
            vec![MinistryRole::MinistryMember],
        )]);
    let mut form = MemberForm::edit(engine(), "dis-2", draft).unwrap();

    form.apply(
        FormEvent::SetRelationType(RelationType::OnlyRelatedHierarchicalCover),
        now,
    )
    .unwrap();
    let once = form.draft().clone();
    assert_eq!(once.ministry_blocks, vec![MinistryBlock::default()]);
    assert!(once.upstream.is_empty());

    form.apply(
        FormEvent::SetRelationType(RelationType::OnlyRelatedHierarchicalCover),
        now,
    )
    .unwrap();
    assert_eq!(form.draft(), &once);
}

#[test]
fn test_strict_duplicates_block_submit() {
    let config = EngineConfig::from_yaml("duplicate_policy: strict\n").unwrap();
    let block = MinistryBlock::assigned(
        "church-1",
        MinistryCategory::Worship,
        "min-1",
        vec![MinistryRole::MinistryMember],
    );
    let draft = MemberDraft::new(MemberModule::Copastor, person())
        .with_relation_type(RelationType::RelatedBothMinistriesAndHierarchicalCover)
        .with_upstream(FieldName::TheirPastor, "pas-1")
        .with_ministry_blocks(vec![block.clone(), block]);

    let strict = MemberForm::edit(Arc::new(Engine::new(config)), "cop-2", draft.clone()).unwrap();
    let view = strict.view().unwrap();
    assert!(view.flags.is_duplicate_warning_visible);
    assert!(view.flags.is_submit_button_disabled);

    let advisory = MemberForm::edit(engine(), "cop-2", draft).unwrap();
    let view = advisory.view().unwrap();
    assert!(view.flags.is_duplicate_warning_visible);
    assert!(!view.flags.is_submit_button_disabled);
}
