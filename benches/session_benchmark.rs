use criterion::{criterion_group, criterion_main, Criterion};
use engageperfect::db::ProfileEvent;
use engageperfect::models::{DashboardView, Identity, PlanType, ProfileDocument};
use engageperfect::session::SessionState;
use std::hint::black_box;

fn stored_profile(used: i64) -> ProfileDocument {
    ProfileDocument {
        plan_type: Some(PlanType::Pro),
        requests_limit: Some(1000),
        requests_used: Some(used),
        ..ProfileDocument::default()
    }
}

fn benchmark_session_events(c: &mut Criterion) {
    let identity = Identity::new("u1")
        .with_display_name("Ann")
        .with_email("a@x.com");

    let mut group = c.benchmark_group("session_state");

    group.bench_function("profile_update_and_view", |b| {
        let mut state = SessionState::new();
        state.on_identity(Some(identity.clone()));
        let generation = state.active_generation().unwrap_or_default();
        let mut used = 0;
        b.iter(|| {
            used = (used + 1) % 1000;
            state.on_profile(ProfileEvent::snapshot(generation, Some(stored_profile(used))));
            black_box(state.view())
        })
    });

    group.bench_function("identity_switch_with_fallback", |b| {
        let other = Identity::new("u2");
        let mut state = SessionState::new();
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let next = if flip { &identity } else { &other };
            state.on_identity(Some(next.clone()));
            if let Some(generation) = state.active_generation() {
                state.on_profile(ProfileEvent::snapshot(generation, None));
            }
            black_box(state.view())
        })
    });

    group.finish();
}

fn benchmark_dashboard(c: &mut Criterion) {
    let mut state = SessionState::new();
    state.on_identity(Some(Identity::new("u1").with_display_name("Ann")));
    if let Some(generation) = state.active_generation() {
        state.on_profile(ProfileEvent::snapshot(generation, Some(stored_profile(850))));
    }
    let view = state.view();

    c.bench_function("dashboard_from_session", |b| {
        b.iter(|| DashboardView::from_session(black_box(&view)))
    });
}

criterion_group!(benches, benchmark_session_events, benchmark_dashboard);
criterion_main!(benches);
