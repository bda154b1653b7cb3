#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use stencil::hir::{DiagnosticCode, NamespaceTable, NoNamespaces, STRING, TypeRef};
use stencil::{AnalysisHost, TextSize};
use tokio_util::sync::CancellationToken;

use crate::helpers::type_fixtures::{shop_cache, shop_model};

#[test]
fn test_workspace_diagnostics_follow_edits() {
    let cache = shop_cache();
    let mut host = AnalysisHost::new(cache.clone(), Arc::new(NoNamespaces));
    host.set_documents([
        ("list.html", "{#for item in items}{item.name}{/for}"),
        ("order.html", "{order.nope}"),
    ]);
    for uri in ["list.html", "order.html"] {
        host.set_data_model(uri, shop_model()).unwrap();
    }
    let cancel = CancellationToken::new();

    let counts = |host: &AnalysisHost| -> Vec<(String, usize)> {
        host.analysis()
            .diagnostics_all(&cancel)
            .unwrap()
            .into_iter()
            .map(|(uri, d)| (uri.to_string(), d.len()))
            .collect()
    };
    assert_eq!(
        counts(&host),
        vec![("list.html".to_string(), 0), ("order.html".to_string(), 1)]
    );

    host.set_document("order.html", "{order.items.size}");
    assert_eq!(counts(&host)[1].1, 0);

    host.remove_document("list.html");
    assert_eq!(counts(&host).len(), 1);
}

#[tokio::test]
async fn test_settled_diagnostics_wait_for_namespace() {
    let cache = shop_cache();
    let namespaces = Arc::new(NamespaceTable::new());
    namespaces.begin_loading("cfg");

    let mut host = AnalysisHost::new(cache.clone(), namespaces.clone());
    host.set_document("page.html", "{cfg:title.length}{cfg:nope}");
    host.set_data_model("page.html", shop_model()).unwrap();
    let cancel = CancellationToken::new();
    let analysis = host.analysis();

    assert!(analysis.diagnostics("page.html", &cancel).unwrap().is_empty());

    let loader = Arc::clone(&namespaces);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        loader.insert("cfg", "title", TypeRef::simple(STRING));
        loader.finish_loading("cfg");
    });

    let settled = tokio::time::timeout(
        Duration::from_secs(5),
        analysis.settled_diagnostics("page.html", &cancel),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].code, DiagnosticCode::UndefinedObject);
    assert_eq!(settled[0].data.as_ref().unwrap().namespace.as_deref(), Some("cfg"));
}

#[test]
fn test_hover_on_loop_alias() {
    let cache = shop_cache();
    let mut host = AnalysisHost::new(cache, Arc::new(NoNamespaces));
    host.set_document("list.html", "{#for item in items}{item.price}{/for}");
    host.set_data_model("list.html", shop_model()).unwrap();

    let hover = host
        .analysis()
        .hover("list.html", TextSize::new(22), &CancellationToken::new())
        .unwrap()
        .unwrap();
    assert_eq!(hover.contents, "`org.acme.Item`");
}
