mod support;

use chrono::Duration;
use presence_app::{IdleReason, PositionError, PositionRequest, TickReport};
use presence_core::TrackingEventType;
use support::{ScriptedSource, fix_at, inside_point, outside_point, setup_app, t0};

#[test]
fn tick_is_idle_without_logged_in_employee() {
    let test_app = setup_app();
    let mut source = ScriptedSource::new(vec![Ok(fix_at(inside_point()))]);
    let report = test_app
        .app
        .services
        .monitor
        .tick(&mut source)
        .expect("tick");
    assert_eq!(report, TickReport::Idle(IdleReason::NoCurrentEmployee));
    assert!(source.requests.is_empty());
}

#[test]
fn tick_is_idle_while_checked_out() {
    let test_app = setup_app();
    let services = &test_app.app.services;
    services.current_employee.login("1024").expect("login");
    let mut source = ScriptedSource::new(vec![Ok(fix_at(inside_point()))]);
    let report = services.monitor.tick(&mut source).expect("tick");
    assert_eq!(report, TickReport::Idle(IdleReason::NotCheckedIn));
    assert!(source.requests.is_empty());
}

#[test]
fn ticks_classify_positions_against_office() {
    let test_app = setup_app();
    let services = &test_app.app.services;
    services.current_employee.login("1024").expect("login");
    services.ledger.check_in("1024").expect("check in");

    let mut source = ScriptedSource::new(vec![
        Ok(fix_at(inside_point())),
        Ok(fix_at(outside_point())),
        Ok(fix_at(inside_point())),
    ]);
    for minute in 1..=3 {
        test_app.clock.set(t0() + Duration::minutes(minute));
        let report = services.monitor.tick(&mut source).expect("tick");
        assert!(matches!(report, TickReport::Pinged { degraded: false, .. }));
    }

    let employee = services
        .ledger
        .get_employee("1024")
        .expect("get")
        .expect("employee");
    let session = employee.active_session().expect("session");
    let inside: Vec<bool> = session.pings.iter().map(|ping| ping.inside_office).collect();
    assert_eq!(inside, vec![true, false, true]);
    let events: Vec<_> = session.events.iter().map(|event| event.kind).collect();
    assert_eq!(
        events,
        vec![TrackingEventType::LeftOffice, TrackingEventType::BackInOffice]
    );
    assert_eq!(session.pings[1].timestamp, t0() + Duration::minutes(2));
}

#[test]
fn timeout_degrades_to_low_accuracy() {
    let test_app = setup_app();
    let services = &test_app.app.services;
    services.current_employee.login("1024").expect("login");
    services.ledger.check_in("1024").expect("check in");

    let mut source = ScriptedSource::new(vec![
        Err(PositionError::Timeout),
        Ok(fix_at(inside_point())),
    ]);
    let report = services.monitor.tick(&mut source).expect("tick");
    assert!(matches!(report, TickReport::Pinged { degraded: true, .. }));
    assert_eq!(
        source.requests,
        vec![PositionRequest::HIGH_ACCURACY, PositionRequest::LOW_ACCURACY]
    );
}

#[test]
fn failed_sample_records_signal_loss() {
    let test_app = setup_app();
    let services = &test_app.app.services;
    services.current_employee.login("1024").expect("login");
    services.ledger.check_in("1024").expect("check in");
    test_app.clock.set(t0() + Duration::minutes(5));

    let mut source = ScriptedSource::new(vec![
        Err(PositionError::Unavailable),
        Err(PositionError::Timeout),
    ]);
    let report = services.monitor.tick(&mut source).expect("tick");
    assert_eq!(
        report,
        TickReport::SignalLost {
            code: "1024".to_string(),
            error: PositionError::Timeout,
        }
    );

    let employee = services
        .ledger
        .get_employee("1024")
        .expect("get")
        .expect("employee");
    assert!(employee.checked_in);
    let session = employee.active_session().expect("session");
    assert_eq!(session.events.len(), 1);
    assert_eq!(session.events[0].kind, TrackingEventType::SignalLost);
    assert_eq!(session.events[0].timestamp, t0() + Duration::minutes(5));
}

#[test]
fn permission_denied_skips_fallback() {
    let test_app = setup_app();
    let services = &test_app.app.services;
    services.current_employee.login("1024").expect("login");
    services.ledger.check_in("1024").expect("check in");

    let mut source = ScriptedSource::new(vec![Err(PositionError::PermissionDenied)]);
    let report = services.monitor.tick(&mut source).expect("tick");
    assert!(matches!(
        report,
        TickReport::SignalLost {
            error: PositionError::PermissionDenied,
            ..
        }
    ));
    assert_eq!(source.requests.len(), 1);
}

#[test]
fn login_rejects_blank_code_and_logout_clears_pointer() {
    let test_app = setup_app();
    let current = &test_app.app.services.current_employee;
    assert!(current.login("   ").is_err());
    assert_eq!(current.login(" 1024 ").expect("login"), "1024");
    assert_eq!(current.current().expect("current").as_deref(), Some("1024"));
    assert!(
        test_app
            .app
            .services
            .ledger
            .get_employee("1024")
            .expect("get")
            .is_some()
    );
    assert_eq!(current.logout().expect("logout").as_deref(), Some("1024"));
    assert_eq!(current.current().expect("current"), None);
    assert!(current.require().is_err());
}
