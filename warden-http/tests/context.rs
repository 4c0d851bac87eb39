use warden_core::TenantId;
use warden_http::TenantContext;

#[tokio::test]
async fn unset_context_reads_none() {
    assert_eq!(TenantContext::current(), None);
}

#[tokio::test]
async fn scope_binds_and_clears() {
    let tenant = TenantId::new(7);
    let observed = TenantContext::scope(Some(tenant), async { TenantContext::current() }).await;
    assert_eq!(observed, Some(tenant));
    assert_eq!(TenantContext::current(), None);
}

#[tokio::test]
async fn anonymous_scope_reads_none() {
    let observed = TenantContext::scope(None, async { TenantContext::current() }).await;
    assert_eq!(observed, None);
}

#[tokio::test]
async fn scopes_are_task_local() {
    let first = tokio::spawn(TenantContext::scope(Some(TenantId::new(1)), async {
        tokio::task::yield_now().await;
        TenantContext::current()
    }));
    let second = tokio::spawn(TenantContext::scope(Some(TenantId::new(2)), async {
        tokio::task::yield_now().await;
        TenantContext::current()
    }));
    assert_eq!(first.await.unwrap(), Some(TenantId::new(1)));
    assert_eq!(second.await.unwrap(), Some(TenantId::new(2)));
}

#[tokio::test]
async fn context_is_cleared_even_on_panic() {
    let handle = tokio::spawn(TenantContext::scope(Some(TenantId::new(9)), async {
        panic!("request blew up");
    }));
    assert!(handle.await.is_err());
    assert_eq!(TenantContext::current(), None);
}
