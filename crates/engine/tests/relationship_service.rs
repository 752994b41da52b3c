//! Behavioural tests for the relationship service against the in-process store.
//!
//! These run without a database. The same scenarios against PostgreSQL live in
//! `store_integration.rs`.
use std::sync::Arc;

use lorekeeper_common::config::RelationshipLimits;
use lorekeeper_common::ids::{CampaignId, NpcId, OrganizationId, PcId, RelationshipId};
use lorekeeper_common::types::{EntityRef, NewRelationship, RelationshipUpdate};
use lorekeeper_common::LorekeeperError;

use lorekeeper_engine::catalog::{provision_default_types, Catalog};
use lorekeeper_engine::relationships::RelationshipService;
use lorekeeper_engine::store::{MemoryStore, RelationshipRepository};

const ARIA: EntityRef = EntityRef::Npc(NpcId(10));
const BRAM: EntityRef = EntityRef::Npc(NpcId(11));
const HERO: EntityRef = EntityRef::Pc(PcId(20));
const GUILD: EntityRef = EntityRef::Organization(OrganizationId(30));

async fn setup() -> (RelationshipService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    provision_default_types(&*store)
        .await
        .expect("Failed to provision default types");

    store.register_entity(ARIA, "Aria");
    store.register_entity(BRAM, "Bram");
    store.register_entity(HERO, "Hero");
    store.register_entity(GUILD, "Thieves' Guild");
    store.register_campaign(CampaignId(1), "Curse of Strahd");

    let repo: Arc<dyn RelationshipRepository> = store.clone();
    let service = RelationshipService::new(repo, Arc::new(Catalog::new()), RelationshipLimits::default());
    service.refresh_catalog().await.expect("Failed to load catalog");

    (service, store)
}

async fn create(
    service: &RelationshipService,
    source: EntityRef,
    target: EntityRef,
    type_name: &str,
) -> RelationshipId {
    let rel_type = service.require_type_by_name(type_name).await.unwrap();
    service
        .create(&NewRelationship::new(source, target, rel_type.id))
        .await
        .unwrap()
}

fn ids(details: &[lorekeeper_common::types::RelationshipDetails]) -> Vec<RelationshipId> {
    details.iter().map(|d| d.relationship.id).collect()
}

// -----------------------------------------------------------------------
// Create and read
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let (service, _) = setup().await;
    let ally = service.require_type_by_name("Ally").await.unwrap();

    let mut new = NewRelationship::new(ARIA, HERO, ally.id);
    new.description = Some("Fought together at Barovia".into());
    new.strength = Some(7);
    new.campaign_id = Some(CampaignId(1));
    let id = service.create(&new).await.unwrap();

    let details = service.get(id).await.unwrap().unwrap();
    let rel = &details.relationship;
    assert_eq!(rel.id, id);
    assert_eq!(rel.source, ARIA);
    assert_eq!(rel.target, HERO);
    assert_eq!(rel.relationship_type_id, ally.id);
    assert_eq!(rel.description.as_deref(), Some("Fought together at Barovia"));
    assert_eq!(rel.strength, Some(7));
    assert!(rel.is_active);
    assert_eq!(rel.campaign_id, Some(CampaignId(1)));

    assert_eq!(details.source_name.as_deref(), Some("Aria"));
    assert_eq!(details.target_name.as_deref(), Some("Hero"));
    assert_eq!(details.relationship_type_name.as_deref(), Some("Ally"));
    assert_eq!(details.campaign_name.as_deref(), Some("Curse of Strahd"));
    assert!(!details.is_directional);
    assert!(details.inverse_type_name.is_none());
}

#[tokio::test]
async fn test_get_missing_relationship_is_none() {
    let (service, _) = setup().await;
    assert!(service.get(RelationshipId(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_active_relationship_is_conflict() {
    let (service, _) = setup().await;
    let friend = service.require_type_by_name("Friend").await.unwrap();
    let new = NewRelationship::new(ARIA, BRAM, friend.id);

    let first = service.create(&new).await.unwrap();
    let err = service.create(&new).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(service.exists(ARIA, BRAM, friend.id).await.unwrap());

    // A deactivated edge frees the identity for a new one.
    service.deactivate(first).await.unwrap();
    assert!(!service.exists(ARIA, BRAM, friend.id).await.unwrap());
    let second = service.create(&new).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_concurrent_creates_admit_exactly_one() {
    let (service, _) = setup().await;
    let service = Arc::new(service);
    let rival = service.require_type_by_name("Rival").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let new = NewRelationship::new(ARIA, BRAM, rival.id);
        handles.push(tokio::spawn(async move { service.create(&new).await }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) if e.is_conflict() => conflicts += 1,
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_unknown_type_is_validation_error() {
    let (service, _) = setup().await;
    let new = NewRelationship::new(ARIA, BRAM, lorekeeper_common::ids::RelationshipTypeId(9999));
    let err = service.create(&new).await.unwrap_err();
    assert!(matches!(err, LorekeeperError::Validation(_)));
}

#[tokio::test]
async fn test_strength_outside_range_is_rejected() {
    let (service, _) = setup().await;
    let friend = service.require_type_by_name("Friend").await.unwrap();

    for strength in [0, 11, -3] {
        let mut new = NewRelationship::new(ARIA, BRAM, friend.id);
        new.strength = Some(strength);
        let err = service.create(&new).await.unwrap_err();
        assert!(matches!(err, LorekeeperError::Validation(_)), "strength {}", strength);
    }

    let mut new = NewRelationship::new(ARIA, BRAM, friend.id);
    new.strength = Some(10);
    assert!(service.create(&new).await.is_ok());
}

#[test]
fn test_unknown_entity_kind_is_rejected() {
    let err = EntityRef::from_parts("dragon", 5).unwrap_err();
    assert!(matches!(err, LorekeeperError::Validation(_)));
    assert_eq!(EntityRef::from_parts("organization", 30).unwrap(), GUILD);
}

// -----------------------------------------------------------------------
// Directionality and inverses
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_directional_edge_only_on_its_own_side() {
    let (service, _) = setup().await;
    let id = create(&service, ARIA, HERO, "Mentor").await;

    assert_eq!(ids(&service.from_entity(ARIA, false).await.unwrap()), vec![id]);
    assert!(service.to_entity(ARIA, false).await.unwrap().is_empty());
    assert_eq!(ids(&service.to_entity(HERO, false).await.unwrap()), vec![id]);
    assert!(service.from_entity(HERO, false).await.unwrap().is_empty());

    assert_eq!(ids(&service.for_entity(ARIA, false).await.unwrap()), vec![id]);
    assert_eq!(ids(&service.for_entity(HERO, false).await.unwrap()), vec![id]);
}

#[tokio::test]
async fn test_inverse_names_resolve_both_ways() {
    let (service, _) = setup().await;

    let mentor = service.get_type_by_name("Mentor").await.unwrap().unwrap();
    let student = service.get_type_by_name("Student").await.unwrap().unwrap();
    assert!(mentor.is_directional);
    assert_eq!(mentor.inverse_type_id, Some(student.id));
    assert_eq!(mentor.inverse_type_name.as_deref(), Some("Student"));
    assert_eq!(student.inverse_type_name.as_deref(), Some("Mentor"));

    let id = create(&service, ARIA, HERO, "Mentor").await;
    let details = service.get(id).await.unwrap().unwrap();
    assert!(details.is_directional);
    assert_eq!(details.inverse_type_name.as_deref(), Some("Student"));
}

#[tokio::test]
async fn test_symmetric_edge_visible_from_both_ends() {
    let (service, _) = setup().await;
    let id = create(&service, ARIA, GUILD, "Enemy").await;

    assert_eq!(ids(&service.for_entity(ARIA, false).await.unwrap()), vec![id]);
    assert_eq!(ids(&service.for_entity(GUILD, false).await.unwrap()), vec![id]);
}

#[tokio::test]
async fn test_reversed_symmetric_edge_is_not_a_duplicate() {
    let (service, _) = setup().await;
    let first_org = EntityRef::Organization(OrganizationId(1));
    let second_org = EntityRef::Organization(OrganizationId(2));
    let friend = service.require_type_by_name("Friend").await.unwrap();

    let forward = service
        .create(&NewRelationship::new(first_org, second_org, friend.id))
        .await
        .unwrap();

    // Uniqueness is on the ordered pair, even for symmetric types.
    assert!(service.exists(first_org, second_org, friend.id).await.unwrap());
    assert!(!service.exists(second_org, first_org, friend.id).await.unwrap());

    let mirror = service
        .create(&NewRelationship::new(second_org, first_org, friend.id))
        .await
        .unwrap();
    assert_ne!(forward, mirror);

    assert_eq!(
        ids(&service.for_entity(first_org, false).await.unwrap()),
        vec![mirror, forward]
    );
    assert_eq!(
        ids(&service.for_entity(second_org, false).await.unwrap()),
        vec![mirror, forward]
    );
}

#[tokio::test]
async fn test_type_lookup_is_case_insensitive() {
    let (service, _) = setup().await;
    let ally = service.get_type_by_name("Ally").await.unwrap().unwrap();
    assert_eq!(ally.name, "Ally");
    let again = service.get_type_by_name("aLLy").await.unwrap().unwrap();
    assert_eq!(again.id, ally.id);
    assert!(service.get_type_by_name("  Ally ").await.unwrap().is_none());

    assert!(service.get_type_by_name("Nemesis").await.unwrap().is_none());
    assert!(service
        .require_type_by_name("Nemesis")
        .await
        .unwrap_err()
        .is_not_found());
    assert_eq!(service.get_type(ally.id).await.unwrap().unwrap().name, "Ally");
}

#[tokio::test]
async fn test_list_types_ordered_by_name() {
    let (service, _) = setup().await;
    let names: Vec<String> = service
        .list_types()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"Ally".to_string()));
}

// -----------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_soft_delete_hides_from_active_queries() {
    let (service, _) = setup().await;
    let id = create(&service, ARIA, BRAM, "Friend").await;

    service.deactivate(id).await.unwrap();

    assert!(service.for_entity(ARIA, false).await.unwrap().is_empty());
    let all = service.for_entity(ARIA, true).await.unwrap();
    assert_eq!(ids(&all), vec![id]);
    assert!(!all[0].relationship.is_active);

    let fetched = service.get(id).await.unwrap().unwrap();
    assert!(!fetched.relationship.is_active);

    service.reactivate(id).await.unwrap();
    assert_eq!(ids(&service.for_entity(ARIA, false).await.unwrap()), vec![id]);
}

#[tokio::test]
async fn test_hard_delete_removes_permanently() {
    let (service, _) = setup().await;
    let id = create(&service, ARIA, BRAM, "Friend").await;

    service.delete(id).await.unwrap();
    assert!(service.get(id).await.unwrap().is_none());
    assert!(service.for_entity(ARIA, true).await.unwrap().is_empty());

    // Deleting again is a no-op.
    service.delete(id).await.unwrap();
}

#[tokio::test]
async fn test_reactivate_beside_active_duplicate_is_conflict() {
    let (service, _) = setup().await;
    let friend = service.require_type_by_name("Friend").await.unwrap();
    let new = NewRelationship::new(ARIA, BRAM, friend.id);

    let old = service.create(&new).await.unwrap();
    service.deactivate(old).await.unwrap();
    let current = service.create(&new).await.unwrap();

    let err = service.reactivate(old).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(service.get(current).await.unwrap().unwrap().relationship.is_active);
    assert!(!service.get(old).await.unwrap().unwrap().relationship.is_active);
}

#[tokio::test]
async fn test_update_changes_content_but_not_identity() {
    let (service, _) = setup().await;
    let id = create(&service, ARIA, HERO, "Patron").await;
    let before = service.get(id).await.unwrap().unwrap().relationship;

    let mut update = RelationshipUpdate::from_current(&before);
    update.description = Some("Owes a favour".into());
    update.strength = Some(3);
    update.campaign_id = Some(CampaignId(1));
    service.update(&update).await.unwrap();

    let after = service.get(id).await.unwrap().unwrap();
    assert_eq!(after.relationship.source, before.source);
    assert_eq!(after.relationship.target, before.target);
    assert_eq!(after.relationship.relationship_type_id, before.relationship_type_id);
    assert_eq!(after.relationship.created_at, before.created_at);
    assert_eq!(after.relationship.description.as_deref(), Some("Owes a favour"));
    assert_eq!(after.relationship.strength, Some(3));
    assert_eq!(after.campaign_name.as_deref(), Some("Curse of Strahd"));
    assert!(after.relationship.updated_at >= before.updated_at);
}

#[tokio::test]
async fn test_update_validates_strength_and_ignores_missing_id() {
    let (service, _) = setup().await;
    let id = create(&service, ARIA, HERO, "Friend").await;
    let current = service.get(id).await.unwrap().unwrap().relationship;

    let mut update = RelationshipUpdate::from_current(&current);
    update.strength = Some(42);
    assert!(matches!(
        service.update(&update).await.unwrap_err(),
        LorekeeperError::Validation(_)
    ));

    let mut missing = RelationshipUpdate::from_current(&current);
    missing.id = RelationshipId(9999);
    service.update(&missing).await.unwrap();
}

// -----------------------------------------------------------------------
// Queries
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_campaign_scoping() {
    let (service, _) = setup().await;
    let ally = service.require_type_by_name("Ally").await.unwrap();

    let mut in_first = Vec::new();
    for source in [ARIA, BRAM, GUILD] {
        let mut scoped = NewRelationship::new(source, HERO, ally.id);
        scoped.campaign_id = Some(CampaignId(1));
        in_first.push(service.create(&scoped).await.unwrap());
    }

    let mut other = NewRelationship::new(ARIA, BRAM, ally.id);
    other.campaign_id = Some(CampaignId(2));
    let in_second = service.create(&other).await.unwrap();

    create(&service, GUILD, BRAM, "Ally").await;

    in_first.reverse();
    assert_eq!(ids(&service.by_campaign(CampaignId(1), false).await.unwrap()), in_first);
    assert_eq!(ids(&service.by_campaign(CampaignId(2), false).await.unwrap()), vec![in_second]);
    assert!(service.by_campaign(CampaignId(7), false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_by_type_filters_relationship_type() {
    let (service, _) = setup().await;
    let friend_id = create(&service, ARIA, BRAM, "Friend").await;
    create(&service, ARIA, BRAM, "Rival").await;
    let friend = service.require_type_by_name("Friend").await.unwrap();

    let results = service.by_type(BRAM, friend.id, false).await.unwrap();
    assert_eq!(ids(&results), vec![friend_id]);
}

#[tokio::test]
async fn test_results_are_newest_first() {
    let (service, _) = setup().await;
    let first = create(&service, ARIA, BRAM, "Friend").await;
    let second = create(&service, ARIA, HERO, "Ally").await;
    let third = create(&service, GUILD, ARIA, "Employer").await;

    let results = service.for_entity(ARIA, false).await.unwrap();
    assert_eq!(ids(&results), vec![third, second, first]);
}

#[tokio::test]
async fn test_queries_on_unknown_entity_are_empty() {
    let (service, _) = setup().await;
    create(&service, ARIA, BRAM, "Friend").await;

    let stranger = EntityRef::Pc(PcId(404));
    assert!(service.for_entity(stranger, true).await.unwrap().is_empty());
    assert!(service.from_entity(stranger, true).await.unwrap().is_empty());
    assert!(service.to_entity(stranger, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_same_id_different_kind_is_a_different_entity() {
    let (service, _) = setup().await;
    create(&service, EntityRef::Npc(NpcId(5)), BRAM, "Friend").await;

    assert!(service
        .for_entity(EntityRef::Pc(PcId(5)), true)
        .await
        .unwrap()
        .is_empty());
}
