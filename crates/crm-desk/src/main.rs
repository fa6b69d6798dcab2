use crm_desk::{DeskConfig, Session};
use crm_views::Route;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let doctype = std::env::args().nth(1).unwrap_or_else(|| "CRM Lead".into());
    let config = DeskConfig::from_env().unwrap_or_else(|e| {
        eprintln!("invalid configuration: {e}");
        std::process::exit(1);
    });
    tracing::info!(base_url = %config.base_url, user = %config.user, "connecting");

    let session = Session::connect(config);

    let meta = session.meta(&doctype);
    if !meta.load().await {
        eprintln!("failed to load schema for {doctype}");
        std::process::exit(1);
    }

    let registry = session.views(Some(&doctype));
    registry.reload().await;
    session.users().reload().await;
    session.settings().ensure().await;

    let mut route = Route::new(&doctype);
    if let Err(e) = session.default_views().apply_default_view(&doctype, &mut route).await {
        tracing::warn!(error = %e, "default open view unavailable");
    }
    let view_type = route.view_type();
    let current = session.resolve_view(&doctype, None, view_type.as_ref());
    let flags = session.flags().await;

    if let Some(name) = session.settings().brand().name {
        println!("site: {name}");
    }
    println!("{doctype}");
    for field in meta.fields(None).unwrap_or_default() {
        println!("  {:<24} {}", field.fieldname(), field.fieldtype.as_str());
    }
    println!("opens in: {} ({})", current.label, current.view_type);
    for view in registry.pinned() {
        println!("  pinned: {} {}", view.name, view.label.as_deref().unwrap_or_default());
    }
    println!(
        "user: {} admin={} manager={}",
        session.users().user(None).full_name().unwrap_or_default(),
        session.users().is_admin(None),
        session.users().is_manager(None),
    );
    println!(
        "calling: {} ({}), whatsapp: {}",
        flags.call_enabled, flags.default_calling_medium, flags.whatsapp_enabled
    );

    if session.is_login_required() {
        eprintln!("login required: check CRM_API_KEY and CRM_API_SECRET");
        std::process::exit(1);
    }
}
