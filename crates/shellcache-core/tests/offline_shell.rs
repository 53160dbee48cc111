use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqwest::Url;
use shellcache_core::{
    CacheStorage, FetchError, HttpNetwork, InstallError, Network, Registry, Request, RequestKey,
    ResourceList, Response, ResponseSource, Shell, ShellWorker, WorkerHost, WorkerState,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Origin whose routes either answer with a body or fail at the transport.
struct ScriptedOrigin {
    routes: HashMap<&'static str, Option<&'static str>>,
    calls: AtomicUsize,
}

impl ScriptedOrigin {
    fn new(routes: &[(&'static str, Option<&'static str>)]) -> Self {
        Self {
            routes: routes.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Network for ScriptedOrigin {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.routes.get(request.url.path()) {
            Some(Some(body)) => Ok(Response::new(200, request.url.as_str(), *body)),
            Some(None) => Err(FetchError::Unavailable("network error".to_string())),
            None => Ok(Response::new(404, request.url.as_str(), "")),
        }
    }
}

fn origin() -> Url {
    Url::parse("http://127.0.0.1:5000").unwrap()
}

fn get(path: &str) -> Request {
    Request::get(origin().join(path).unwrap())
}

#[tokio::test]
async fn failed_install_leaves_nothing_cached() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(CacheStorage::new(dir.path().to_path_buf()).unwrap());
    let network = Arc::new(ScriptedOrigin::new(&[("/", Some("HOME")), ("/a.png", None)]));
    let shell = Shell {
        cache_name: "library-cache-v1".to_string(),
        origin: origin(),
        resources: ResourceList::new(["/", "/a.png"]),
    };
    let worker = ShellWorker::new(storage.clone(), network.clone(), shell);

    let err = worker.on_install().await.unwrap_err();
    assert!(matches!(err, InstallError::Fetch { ref path, .. } if path == "/a.png"));

    // The batch commits atomically, so "/" was not persisted either.
    let cache = storage.open("library-cache-v1").await.unwrap();
    assert!(cache.is_empty().await);

    let before = network.calls();
    let home = worker.resolve(&get("/")).await.unwrap();
    assert_eq!(home.source, ResponseSource::Network);
    assert_eq!(home.response.text(), "HOME");
    assert_eq!(network.calls(), before + 1);

    let icon = worker.on_fetch(&get("/a.png")).await;
    assert!(matches!(icon, Err(FetchError::Unavailable(_))));
    assert_eq!(network.calls(), before + 2);
}

#[tokio::test]
async fn installed_shell_serves_while_origin_fails() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(CacheStorage::new(dir.path().to_path_buf()).unwrap());
    let online = Arc::new(ScriptedOrigin::new(&[("/", Some("HOME")), ("/a.png", Some("PNG"))]));
    let shell = Shell {
        cache_name: "library-cache-v1".to_string(),
        origin: origin(),
        resources: ResourceList::new(["/", "/a.png"]),
    };
    ShellWorker::new(storage.clone(), online, shell.clone())
        .on_install()
        .await
        .unwrap();

    // Same storage, origin now unreachable.
    let offline = Arc::new(ScriptedOrigin::new(&[("/", None), ("/a.png", None), ("/view_books", None)]));
    let worker = ShellWorker::new(storage, offline.clone(), shell);

    assert_eq!(worker.on_fetch(&get("/")).await.unwrap().text(), "HOME");
    assert_eq!(worker.on_fetch(&get("/a.png")).await.unwrap().text(), "PNG");
    assert_eq!(offline.calls(), 0);

    assert!(worker.on_fetch(&get("/view_books")).await.is_err());
    assert_eq!(offline.calls(), 1);
}

#[tokio::test]
async fn new_version_uses_a_disjoint_store() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(CacheStorage::new(dir.path().to_path_buf()).unwrap());
    let network = Arc::new(ScriptedOrigin::new(&[("/", Some("HOME"))]));

    for name in ["library-cache-v1", "library-cache-v2"] {
        let shell = Shell {
            cache_name: name.to_string(),
            origin: origin(),
            resources: ResourceList::new(["/"]),
        };
        ShellWorker::new(storage.clone(), network.clone(), shell)
            .on_install()
            .await
            .unwrap();
    }

    // The old generation is left in place.
    assert_eq!(
        storage.keys().unwrap(),
        vec!["library-cache-v1".to_string(), "library-cache-v2".to_string()]
    );
}

#[tokio::test]
async fn http_install_then_hits_without_network() {
    let mock_server = MockServer::start().await;

    let shell_routes = [
        ("/", "<html>library</html>"),
        ("/student_login", "<form>login</form>"),
        ("/student_register", "<form>register</form>"),
        ("/static/icon-192x192.png", "png-192"),
        ("/static/icon-512x512.png", "png-512"),
    ];
    for (route, body) in shell_routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/view_books"))
        .respond_with(ResponseTemplate::new(200).set_body_string("books"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(CacheStorage::new(dir.path().join("caches")).unwrap());
    let origin = Url::parse(&mock_server.uri()).unwrap();
    let worker = ShellWorker::new(
        storage,
        Arc::new(HttpNetwork::new().unwrap()),
        Shell::app_shell(origin.clone()),
    );
    let host = WorkerHost::new(worker, Registry::new(dir.path().join("caches")));

    let report = host.install().await.expect("install failed");
    assert_eq!(report.stored, 5);
    assert_eq!(host.state().await, WorkerState::Activated);

    for (route, body) in shell_routes {
        let request = Request::get(origin.join(route).unwrap());
        let resolved = host.dispatch_fetch(&request).await.unwrap();
        assert_eq!(resolved.source, ResponseSource::Cache, "{}", route);
        assert_eq!(resolved.response.text(), body);
    }

    for _ in 0..2 {
        let request = Request::get(origin.join("/view_books").unwrap());
        let resolved = host.dispatch_fetch(&request).await.unwrap();
        assert_eq!(resolved.source, ResponseSource::Network);
    }

    let cache = host.worker().storage().open("library-cache-v1").await.unwrap();
    let key = RequestKey::from_url(&origin.join("/view_books").unwrap());
    assert!(cache.match_key(&key).await.unwrap().is_none());

    // Mock expectations are verified when the server drops.
}

#[tokio::test]
async fn http_install_fails_on_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("HOME"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/student_login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(CacheStorage::new(dir.path().to_path_buf()).unwrap());
    let shell = Shell {
        cache_name: "library-cache-v1".to_string(),
        origin: Url::parse(&mock_server.uri()).unwrap(),
        resources: ResourceList::new(["/", "/student_login"]),
    };
    let worker = ShellWorker::new(storage, Arc::new(HttpNetwork::new().unwrap()), shell);
    let host = WorkerHost::new(worker, Registry::new(dir.path().to_path_buf()));

    let err = host.install().await.unwrap_err();
    assert!(matches!(err, InstallError::BadStatus { status: 500, .. }));
    assert_eq!(host.state().await, WorkerState::Redundant);
}
