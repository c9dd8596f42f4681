//! In-process stand-in for the cluster management API.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use warp::{path::FullPath, Filter};

#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
pub(crate) struct MockApi {
    paths: Arc<Mutex<HashMap<String, (u16, String)>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockApi {
    pub fn set_content(&self, path: &str, return_code: u16, content: &str) {
        let mut paths = self.paths.lock().unwrap();
        paths.insert(path.to_string(), (return_code, content.to_string()));
    }

    pub fn set_json(&self, path: &str, return_code: u16, content: &serde_json::Value) {
        self.set_content(path, return_code, &content.to_string());
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Serve on an ephemeral localhost port and return the base URL
    pub fn start(&self) -> String {
        let paths = self.paths.clone();
        let requests = self.requests.clone();
        let routes = warp::path::full()
            .and(warp::filters::query::query())
            .and(warp::header::optional::<String>("authorization"))
            .map(
                move |path: FullPath, query: HashMap<String, String>, authorization| {
                    requests.lock().unwrap().push(Request {
                        path: path.as_str().to_string(),
                        query,
                        authorization,
                    });

                    let paths = paths.lock().unwrap();
                    let builder = warp::http::Response::builder();
                    match paths.get(path.as_str()) {
                        Some((code, content)) => builder
                            .status(*code)
                            .header("content-type", "application/json")
                            .body(content.to_string()),
                        None => builder
                            .status(404)
                            .body(format!("{} not found", path.as_str())),
                    }
                },
            );

        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{addr}")
    }
}
