use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use strata_core::{
    ImageCatalog, PageLimits, QuerySpec, RegistryError, VisibilityScope,
    database::{ImageRepository, InMemoryImageRepository},
};
use strata_model::{
    ContainerFormat, DiskFormat, ImageId, ImageRecord, ImageStatus,
    ImageUpdate, NewImage,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2011, 2, 14, 9, 30, 0).unwrap()
}

fn image(id: i64, created_at: DateTime<Utc>) -> ImageRecord {
    let mut record = ImageRecord::new(ImageId(id), created_at);
    record.is_public = true;
    record.status = ImageStatus::Active;
    record.disk_format = Some(DiskFormat::Vhd);
    record.container_format = Some(ContainerFormat::Ovf);
    record
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> ImageId) -> Vec<i64> {
    items.iter().map(|item| id(item).get()).collect()
}

async fn catalog_with(
    records: Vec<ImageRecord>,
    limits: PageLimits,
) -> (ImageCatalog, Arc<InMemoryImageRepository>) {
    let repo = Arc::new(InMemoryImageRepository::new());
    repo.seed(records).await.unwrap();
    let catalog = ImageCatalog::new(repo.clone(), limits);
    (catalog, repo)
}

/// The registry fixture: one private image, one public image.
fn fixture() -> Vec<ImageRecord> {
    let mut private = image(1, t0());
    private.name = Some("fake image #1".into());
    private.is_public = false;
    private.owner = Some("tenant-a".into());
    private.disk_format = Some(DiskFormat::Ami);
    private.container_format = Some(ContainerFormat::Ami);
    private.size = 13;

    let mut public = image(2, t0() + Duration::seconds(1));
    public.name = Some("fake image #2".into());
    public.size = 19;
    public.checksum = Some("06ff575a2856444fbe93100157ed74ad".into());

    vec![private, public]
}

#[tokio::test]
async fn marker_resumes_after_the_named_image() {
    let t1 = t0() + Duration::hours(1);
    let (catalog, _) = catalog_with(
        vec![image(2, t0()), image(3, t1), image(4, t1), image(5, t0())],
        PageLimits::default(),
    )
    .await;

    let page = catalog
        .list(&QuerySpec::new().marker(ImageId(4)), &VisibilityScope::All)
        .await
        .unwrap();

    assert_eq!(ids(&page, |s| s.id), vec![3, 5, 2]);
}

#[tokio::test]
async fn malformed_limits_are_rejected_before_listing() {
    for limit in ["-1", "a"] {
        let err = QuerySpec::from_params([("limit", limit)]).unwrap_err();
        assert_eq!(err.parameter(), Some("limit"));
    }
}

#[tokio::test]
async fn size_range_is_inclusive_on_both_ends() {
    let mut records = Vec::new();
    for (id, size) in [(1, 18), (2, 19), (3, 20)] {
        let mut record = image(id, t0() + Duration::seconds(id));
        record.size = size;
        records.push(record);
    }
    let (catalog, _) = catalog_with(records, PageLimits::default()).await;

    let spec = QuerySpec::from_params([("size_min", "19"), ("size_max", "19")])
        .unwrap();
    let page = catalog.list(&spec, &VisibilityScope::All).await.unwrap();

    assert_eq!(ids(&page, |s| s.id), vec![2]);
}

#[tokio::test]
async fn property_filters_match_exactly() {
    let mut exact = image(1, t0());
    exact.properties.insert("prop_123".into(), "v a".into());
    let mut partial = image(2, t0());
    partial.properties.insert("prop_123".into(), "v".into());
    let mut other_key = image(3, t0());
    other_key.properties.insert("prop_456".into(), "v a".into());
    let (catalog, _) =
        catalog_with(vec![exact, partial, other_key], PageLimits::default())
            .await;

    let spec = QuerySpec::from_params([("property-prop_123", "v a")]).unwrap();
    let page = catalog
        .list_detail(&spec, &VisibilityScope::All)
        .await
        .unwrap();

    assert_eq!(ids(&page, |r| r.id), vec![1]);
}

#[tokio::test]
async fn private_images_are_not_found_outside_their_project() {
    let (catalog, _) = catalog_with(fixture(), PageLimits::default()).await;

    let err = catalog
        .get_detail(ImageId(1), &VisibilityScope::PublicOnly)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::NotFound(ImageId(1)));

    let err = catalog
        .get_detail(ImageId(1), &VisibilityScope::owned_or_public("tenant-b"))
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::NotFound(ImageId(1)));

    let owned = catalog
        .get_detail(ImageId(1), &VisibilityScope::owned_or_public("tenant-a"))
        .await
        .unwrap();
    assert_eq!(owned.name.as_deref(), Some("fake image #1"));
}

#[tokio::test]
async fn public_listing_shows_only_public_images() {
    let (catalog, _) = catalog_with(fixture(), PageLimits::default()).await;

    let page = catalog
        .list(&QuerySpec::new(), &VisibilityScope::PublicOnly)
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, ImageId(2));
    assert_eq!(page[0].name.as_deref(), Some("fake image #2"));
    assert_eq!(page[0].size, 19);
}

#[tokio::test]
async fn scope_never_leaks_other_projects_private_images() {
    let mut records = Vec::new();
    for id in 1..=12 {
        let mut record = image(id, t0() + Duration::minutes(id));
        record.is_public = id % 3 == 0;
        record.owner = Some(if id % 2 == 0 { "even" } else { "odd" }.into());
        records.push(record);
    }
    let (catalog, _) = catalog_with(records, PageLimits::new(50, 50)).await;

    for project in ["even", "odd"] {
        let page = catalog
            .list_detail(
                &QuerySpec::new(),
                &VisibilityScope::owned_or_public(project),
            )
            .await
            .unwrap();
        assert!(
            page.iter()
                .all(|r| r.is_public || r.owner.as_deref() == Some(project))
        );
    }

    let anonymous = catalog
        .list_detail(&QuerySpec::new(), &VisibilityScope::PublicOnly)
        .await
        .unwrap();
    assert_eq!(ids(&anonymous, |r| r.id), vec![12, 9, 6, 3]);
}

#[tokio::test]
async fn paging_with_markers_reproduces_the_full_listing() {
    let mut records = Vec::new();
    for id in 1..=23 {
        // Several images share a timestamp so the id tie-break matters.
        records.push(image(id, t0() + Duration::seconds(id / 4)));
    }
    let (catalog, _) = catalog_with(records, PageLimits::new(100, 100)).await;
    let scope = VisibilityScope::All;

    let full = catalog.list(&QuerySpec::new(), &scope).await.unwrap();
    assert_eq!(full.len(), 23);

    for page_size in [1, 4, 5, 23, 30] {
        let mut collected = Vec::new();
        let mut spec = QuerySpec::new().limit(page_size);
        loop {
            let page = catalog.list(&spec, &scope).await.unwrap();
            let Some(last) = page.last() else { break };
            spec = spec.marker(last.id);
            collected.extend(page);
        }
        assert_eq!(collected, full, "page size {page_size}");
    }
}

#[tokio::test]
async fn filters_compose_as_intersection() {
    let mut records = Vec::new();
    for id in 1..=8 {
        let mut record = image(id, t0() + Duration::seconds(id));
        record.size = (id as u64) * 10;
        if id % 2 == 0 {
            record.properties.insert("distro".into(), "ubuntu".into());
        }
        if id > 4 {
            record.disk_format = Some(DiskFormat::Qcow2);
            record.container_format = Some(ContainerFormat::Bare);
        }
        records.push(record);
    }
    let (catalog, _) = catalog_with(records, PageLimits::default()).await;
    let scope = VisibilityScope::All;

    let listed = |spec: QuerySpec| {
        let catalog = catalog.clone();
        let scope = scope.clone();
        async move {
            let page = catalog.list(&spec, &scope).await.unwrap();
            ids(&page, |s| s.id)
        }
    };

    let by_property = listed(QuerySpec::new().property("distro", "ubuntu")).await;
    let by_format = listed(QuerySpec::new().disk_format("qcow2")).await;
    let by_size = listed(QuerySpec::new().size_max(70)).await;
    let combined = listed(
        QuerySpec::new()
            .property("distro", "ubuntu")
            .disk_format("qcow2")
            .size_max(70),
    )
    .await;

    let expected: Vec<i64> = by_property
        .iter()
        .copied()
        .filter(|id| by_format.contains(id) && by_size.contains(id))
        .collect();
    assert_eq!(combined, expected);
    assert_eq!(combined, vec![6]);
}

#[tokio::test]
async fn repeated_listings_are_identical() {
    let (catalog, _) = catalog_with(
        (1..=10).map(|id| image(id, t0())).collect(),
        PageLimits::default(),
    )
    .await;
    let spec = QuerySpec::new().limit(6);

    let first = catalog.list(&spec, &VisibilityScope::All).await.unwrap();
    let second = catalog.list(&spec, &VisibilityScope::All).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ids(&first, |s| s.id), vec![10, 9, 8, 7, 6, 5]);
}

#[tokio::test]
async fn deleted_images_disappear_from_every_view() {
    let (catalog, repo) = catalog_with(
        vec![image(1, t0()), image(2, t0())],
        PageLimits::default(),
    )
    .await;
    let mut pending = image(3, t0());
    pending.status = ImageStatus::PendingDelete;
    repo.seed([pending]).await.unwrap();

    catalog
        .delete(ImageId(2), &VisibilityScope::All)
        .await
        .unwrap();

    let page = catalog
        .list(&QuerySpec::new(), &VisibilityScope::All)
        .await
        .unwrap();
    assert_eq!(ids(&page, |s| s.id), vec![1]);

    let filtered = catalog
        .list(&QuerySpec::new().status("deleted"), &VisibilityScope::All)
        .await
        .unwrap();
    assert!(filtered.is_empty());

    assert_eq!(
        catalog.get_detail(ImageId(2), &VisibilityScope::All).await,
        Err(RegistryError::NotFound(ImageId(2)))
    );
    assert!(repo.get_by_id(ImageId(2)).await.unwrap().is_some());
}

#[tokio::test]
async fn markers_must_name_a_visible_filtered_image() {
    let (catalog, _) = catalog_with(fixture(), PageLimits::default()).await;

    // Absent.
    let err = catalog
        .list(&QuerySpec::new().marker(ImageId(42)), &VisibilityScope::All)
        .await
        .unwrap_err();
    assert_eq!(err.parameter(), Some("marker"));

    // Present but private to another project.
    let err = catalog
        .list(
            &QuerySpec::new().marker(ImageId(1)),
            &VisibilityScope::PublicOnly,
        )
        .await
        .unwrap_err();
    assert_eq!(err.parameter(), Some("marker"));

    // Visible but excluded by the filters.
    let err = catalog
        .list(
            &QuerySpec::new().marker(ImageId(2)).size_max(10),
            &VisibilityScope::All,
        )
        .await
        .unwrap_err();
    assert_eq!(err.parameter(), Some("marker"));

    // Non-integer markers never reach the catalog.
    let err = QuerySpec::from_params([("marker", "two")]).unwrap_err();
    assert_eq!(err.parameter(), Some("marker"));
}

#[tokio::test]
async fn limits_are_clamped_and_zero_is_empty() {
    let (catalog, _) = catalog_with(
        (1..=40).map(|id| image(id, t0())).collect(),
        PageLimits::default(),
    )
    .await;
    let scope = VisibilityScope::All;

    let default_page = catalog.list(&QuerySpec::new(), &scope).await.unwrap();
    assert_eq!(default_page.len(), 25);

    let clamped = catalog
        .list(&QuerySpec::new().limit(1000), &scope)
        .await
        .unwrap();
    assert_eq!(clamped.len(), 25);

    let empty = catalog
        .list(&QuerySpec::new().limit(0), &scope)
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn unknown_parameters_are_rejected() {
    let err =
        QuerySpec::from_params([("name", "x"), ("is_public", "true")]).unwrap_err();
    assert_eq!(err.parameter(), Some("is_public"));
}

#[tokio::test]
async fn writes_round_trip_through_the_catalog() {
    let (catalog, _) = catalog_with(fixture(), PageLimits::default()).await;
    let project = VisibilityScope::owned_or_public("tenant-a");

    let mut properties = std::collections::BTreeMap::new();
    properties.insert("arch".to_string(), "x86_64".to_string());
    properties.insert("distro".to_string(), "fedora".to_string());
    let created = catalog
        .create(
            NewImage {
                name: Some("fake image #3".into()),
                disk_format: Some(DiskFormat::Qcow2),
                container_format: Some(ContainerFormat::Bare),
                properties,
                ..NewImage::default()
            },
            &project,
        )
        .await
        .unwrap();
    assert_eq!(created.id, ImageId(3));
    assert_eq!(created.status, ImageStatus::Queued);
    assert_eq!(created.owner.as_deref(), Some("tenant-a"));

    let mut supplied = std::collections::BTreeMap::new();
    supplied.insert("arch".to_string(), "aarch64".to_string());
    let updated = catalog
        .update(
            created.id,
            ImageUpdate {
                status: Some(ImageStatus::Active),
                properties: Some(supplied),
                ..ImageUpdate::default()
            },
            true,
            &project,
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ImageStatus::Active);
    assert_eq!(updated.property("arch"), Some("aarch64"));
    assert_eq!(updated.property("distro"), None);

    let forbidden = catalog
        .delete(created.id, &VisibilityScope::owned_or_public("tenant-b"))
        .await
        .unwrap_err();
    assert_eq!(forbidden, RegistryError::NotFound(created.id));
}
