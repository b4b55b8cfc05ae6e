use lifemark::prelude::*;
use std::sync::Barrier;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Lifecycle, Default)]
#[lifecycle(hooks, name = "app::Base")]
pub struct Base {
    #[configuration("service.name")]
    name: String,
    initialized: u32,
}

#[hooks]
impl Base {
    #[post_construct]
    fn init(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.name.is_empty(), "service.name is not configured");
        self.initialized += 1;
        Ok(())
    }
}

#[derive(Lifecycle, Default)]
#[lifecycle(name = "app::Derived")]
pub struct Derived {
    #[lifecycle(parent)]
    base: Base,
}

#[derive(Lifecycle, Default)]
#[lifecycle(hooks, name = "app::Override")]
pub struct Override {
    #[lifecycle(parent)]
    base: Base,
    #[configuration("override.name")]
    name: String,
    started: bool,
}

#[hooks]
impl Override {
    #[post_construct]
    fn init(&mut self) {
        self.started = true;
    }

    #[pre_destroy]
    pub fn close(&self) {}
}

#[derive(Lifecycle)]
#[resource("jdbc/main")]
#[lifecycle(name = "app::DataSource")]
pub struct DataSource;

#[allow(dead_code)]
#[derive(Lifecycle)]
#[lifecycle(name = "app::SignupForm")]
pub struct SignupForm {
    #[validate]
    email: String,
}

#[derive(Lifecycle, Default)]
#[lifecycle(hooks, name = "app::Socket", implements("app::Closeable"))]
pub struct Socket {
    closed: bool,
}

#[hooks]
impl Socket {
    #[hook]
    fn close(&mut self) {
        self.closed = true;
    }
}

static WARMED: AtomicUsize = AtomicUsize::new(0);

#[derive(Lifecycle)]
#[lifecycle(hooks, name = "app::Templates")]
pub struct Templates;

#[hooks]
impl Templates {
    #[warm_up]
    pub fn warm() {
        WARMED.fetch_add(1, Ordering::SeqCst);
    }
}

const POLICIES: [BindPolicy; 3] = [BindPolicy::All, BindPolicy::PublicOnly, BindPolicy::Disabled];

fn engine(policy: BindPolicy) -> LifecycleEngine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    LifecycleEngine::builder()
        .bind_policy(policy)
        .preload_threads(2)
        .build()
        .unwrap()
}

fn closeable() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.register(Arc::new(
        ClassDescriptor::interface("app::Closeable")
            .method(MethodDescriptor::new("close").with_marker(MarkerKind::PreDestroy))
            .build(),
    ));
    registry
}

#[test]
fn test_inherited_members_are_reported() {
    let engine = engine(BindPolicy::All);
    let metadata = engine.metadata_for::<Derived>().unwrap();

    let init = metadata.methods(MarkerKind::PostConstruct);
    assert_eq!(init.len(), 1);
    assert_eq!(init[0].name(), "init");
    assert_eq!(init[0].id().declaring(), "app::Base");

    let config = metadata.fields(MarkerKind::Configuration);
    assert_eq!(config.len(), 1);
    assert_eq!(config[0].name(), "name");
    assert_eq!(config[0].marker(MarkerKind::Configuration).unwrap().value(), Some("service.name"));

    assert!(metadata.has_lifecycle_work());
    assert!(!metadata.has_resource_work());
}

#[test]
fn test_hooks_run_against_embedded_parent() {
    let engine = engine(BindPolicy::All);
    let metadata = engine.metadata_for::<Derived>().unwrap();
    let name = &metadata.fields(MarkerKind::Configuration)[0];
    let mut derived = Derived::default();

    engine
        .invoker()
        .set_field(name, Some(&mut derived), Box::new(String::from("billing")))
        .unwrap();
    let ran = engine.run_hooks(&mut derived, MarkerKind::PostConstruct).unwrap();

    assert_eq!(ran, 1);
    assert_eq!(derived.base.name, "billing");
    assert_eq!(derived.base.initialized, 1);
}

#[test]
fn test_fallback_matches_direct_handles() {
    let mut outcomes = Vec::new();
    for policy in POLICIES {
        let engine = engine(policy);
        let metadata = engine.metadata_for::<Derived>().unwrap();
        let init = &metadata.methods(MarkerKind::PostConstruct)[0];
        let name = &metadata.fields(MarkerKind::Configuration)[0];
        let invoker = engine.invoker();
        let mut derived = Derived::default();

        let failed = invoker.invoke(init, Some(&mut derived)).unwrap_err();
        assert!(failed.is_target_failure());

        invoker
            .set_field(name, Some(&mut derived), Box::new(String::from("orders")))
            .unwrap();
        let wrong = invoker.set_field(name, Some(&mut derived), Box::new(7_u8));
        assert!(matches!(wrong, Err(InvokeError::ValueType { .. })));

        invoker.invoke(init, Some(&mut derived)).unwrap();
        let read: String = invoker.get_field_as(name, Some(&derived)).unwrap();

        outcomes.push((read, derived.base.initialized));
    }

    assert!(outcomes.iter().all(|o| *o == (String::from("orders"), 1)));
}

#[test]
fn test_bind_policy_controls_handles() {
    for (policy, bound) in POLICIES.into_iter().zip([true, false, false]) {
        let engine = engine(policy);
        let metadata = engine.metadata_for::<Override>().unwrap();
        let init = &metadata.methods(MarkerKind::PostConstruct)[0];
        let close = &metadata.methods(MarkerKind::PreDestroy)[0];

        assert_eq!(engine.handles().method_bound(init.id()), Some(bound));
        // Public members bind unless binding is disabled
        assert_eq!(
            engine.handles().method_bound(close.id()),
            Some(policy != BindPolicy::Disabled)
        );
    }
}

#[test]
fn test_subtype_shadows_parent_members() {
    let engine = engine(BindPolicy::All);
    let metadata = engine.metadata_for::<Override>().unwrap();

    let config = metadata.fields(MarkerKind::Configuration);
    assert_eq!(config.len(), 1);
    assert_eq!(config[0].id().declaring(), "app::Override");

    let init = metadata.methods(MarkerKind::PostConstruct);
    assert_eq!(init.len(), 1);
    assert_eq!(init[0].id().declaring(), "app::Override");

    let mut target = Override::default();
    engine.run_hooks(&mut target, MarkerKind::PostConstruct).unwrap();
    assert!(target.started);
    assert_eq!(target.base.initialized, 0);
}

#[test]
fn test_class_resource_alone() {
    let engine = engine(BindPolicy::All);
    let metadata = engine.metadata_for::<DataSource>().unwrap();

    assert!(metadata.has_resource_work());
    assert!(!metadata.has_lifecycle_work());
    let resource = &metadata.class_markers(MarkerKind::Resource)[0];
    assert_eq!(resource.value(), Some("jdbc/main"));
}

#[test]
fn test_validated_field_alone() {
    let engine = engine(BindPolicy::All);
    let metadata = engine.metadata_for::<SignupForm>().unwrap();

    assert!(metadata.has_lifecycle_work());
    assert!(!metadata.has_resource_work());
    assert!(metadata.fields(MarkerKind::Configuration).is_empty());
}

#[test]
fn test_interface_hooks_dispatch_to_implementation() {
    for policy in POLICIES {
        let engine = LifecycleEngine::builder()
            .loader(closeable())
            .bind_policy(policy)
            .build()
            .unwrap();
        let metadata = engine.metadata_for::<Socket>().unwrap();
        let close = &metadata.methods(MarkerKind::PreDestroy)[0];
        assert_eq!(close.id().declaring(), "app::Closeable");
        assert!(close.is_abstract());

        let mut socket = Socket::default();
        engine.run_hooks(&mut socket, MarkerKind::PreDestroy).unwrap();
        assert!(socket.closed);
    }
}

#[test]
fn test_unresolved_interface_is_skipped() {
    let engine = engine(BindPolicy::All);
    let metadata = engine.metadata_for::<Socket>().unwrap();

    assert!(metadata.methods(MarkerKind::PreDestroy).is_empty());
    assert!(!metadata.has_lifecycle_work());
}

#[test]
fn test_static_hooks_ignore_target() {
    let before = WARMED.load(Ordering::SeqCst);
    for policy in [BindPolicy::All, BindPolicy::Disabled] {
        let engine = engine(policy);
        let metadata = engine.metadata_for::<Templates>().unwrap();
        let warm = &metadata.methods(MarkerKind::WarmUp)[0];
        assert!(warm.is_static());
        engine.invoker().invoke(warm, None).unwrap();
    }
    assert_eq!(WARMED.load(Ordering::SeqCst), before + 2);
}

#[test]
fn test_concurrent_first_access_extracts_once() {
    let engine = engine(BindPolicy::All);
    let barrier = Barrier::new(8);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    engine.metadata_for::<Override>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(engine.cache().stats().extractions(), 1);
}

#[test]
fn test_preload_warms_the_cache() {
    let engine = engine(BindPolicy::All);
    let classes = vec![Derived::descriptor(), DataSource::descriptor(), Templates::descriptor()];

    let report = engine.preload(&classes).unwrap();
    assert_eq!(report.loaded, 3);
    assert_eq!(report.failed, 0);

    let hits = engine.cache().stats().hits();
    engine.metadata_for::<Derived>().unwrap();
    assert_eq!(engine.cache().stats().hits(), hits + 1);
}
