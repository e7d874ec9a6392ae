use std::time::Duration;

use async_trait::async_trait;
use porthole_core::api::{
    settings_form_fields, ApiError, ConnectionSubmission, PortholeApi, QuerySubmission, SchemaInfo,
};
use porthole_core::settings::{ConfigSections, GeneralSettings};
use reqwest::{Client, Response};

/// [`PortholeApi`] over the server's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpPortholeApi {
    client: Client,
    root: String,
}

impl HttpPortholeApi {
    pub fn new(root: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(to_api_error)?;
        let root = root.into().trim_end_matches('/').to_string();
        Ok(Self { client, root })
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Joins path segments onto the server root, percent-encoding each one.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.root.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn get(&self, segments: &[&str]) -> Result<Response, ApiError> {
        let url = self.endpoint(segments);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).send().await.map_err(to_api_error)?;
        check_status(response)
    }

    async fn post_form(
        &self,
        segments: &[&str],
        fields: &[(&'static str, String)],
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(segments);
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .form(fields)
            .send()
            .await
            .map_err(to_api_error)?;
        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!(status = status.as_u16(), url = %response.url(), "server rejected request");
        Err(ApiError::Status {
            status: status.as_u16(),
        })
    }
}

fn to_api_error(error: reqwest::Error) -> ApiError {
    if error.is_decode() {
        ApiError::Decode(error.to_string())
    } else {
        ApiError::Transport(error.to_string())
    }
}

async fn read_text(response: Response) -> Result<String, ApiError> {
    response.text().await.map_err(to_api_error)
}

#[async_trait]
impl PortholeApi for HttpPortholeApi {
    async fn load_config(&self) -> Result<ConfigSections, ApiError> {
        self.get(&["api", "config"])
            .await?
            .json()
            .await
            .map_err(to_api_error)
    }

    async fn list_queries(&self) -> Result<Vec<String>, ApiError> {
        self.get(&["api", "queries"])
            .await?
            .json()
            .await
            .map_err(to_api_error)
    }

    async fn test_connection(&self, connection: &str) -> Result<String, ApiError> {
        read_text(self.get(&["api", "test_connection", connection]).await?).await
    }

    async fn schema_info(&self, connection: &str) -> Result<SchemaInfo, ApiError> {
        let body = read_text(self.get(&["api", "schema_info", connection]).await?).await?;
        SchemaInfo::from_body(&body)
    }

    async fn query_text(&self, query_name: &str) -> Result<String, ApiError> {
        read_text(self.get(&["api", "queries", query_name]).await?).await
    }

    async fn submit_query(&self, submission: &QuerySubmission) -> Result<Vec<String>, ApiError> {
        self.post_form(
            &["api", "queries", &submission.query_name],
            &submission.form_fields(),
        )
        .await?
        .json()
        .await
        .map_err(to_api_error)
    }

    async fn submit_connection(&self, submission: &ConnectionSubmission) -> Result<(), ApiError> {
        self.post_form(&["config"], &submission.form_fields())
            .await
            .map(|_| ())
    }

    async fn submit_settings(&self, settings: &GeneralSettings) -> Result<(), ApiError> {
        self.post_form(&["config"], &settings_form_fields(settings))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use porthole_core::api::{
        ApiError, ConnectionSubmission, PortholeApi, QuerySubmission, SchemaInfo,
    };
    use porthole_core::schema_metadata::SchemaMetadataRow;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::HttpPortholeApi;

    /// Serves exactly one canned response and hands back the raw request.
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let root = format!("http://{}", listener.local_addr().expect("local addr"));

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept connection");
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            stream.shutdown().await.expect("shutdown stream");
            request
        });

        (root, handle)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let read = stream.read(&mut chunk).await.expect("read request");
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..read]);

            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    #[test]
    fn endpoint_percent_encodes_each_segment() {
        let api = HttpPortholeApi::new("http://localhost:5000/", None).expect("client");
        assert_eq!(api.root(), "http://localhost:5000");
        assert_eq!(
            api.endpoint(&["api", "queries", "daily report/v2?"]),
            "http://localhost:5000/api/queries/daily%20report%2Fv2%3F"
        );
    }

    #[tokio::test]
    async fn schema_info_decodes_rows() {
        let (root, server) = serve_once(
            "200 OK",
            "application/json",
            r#"[{"table_schema":"public","table_name":"users","column_name":"id"}]"#,
        )
        .await;
        let api = HttpPortholeApi::new(root, None).expect("client");

        let info = api.schema_info("sales db").await.expect("schema info");
        assert_eq!(
            info,
            SchemaInfo::Rows(vec![SchemaMetadataRow::new("public", "users", "id")])
        );

        let request = server.await.expect("server task");
        assert!(request.starts_with("GET /api/schema_info/sales%20db HTTP/1.1"));
    }

    #[tokio::test]
    async fn schema_info_string_body_is_unavailable() {
        let (root, server) = serve_once("200 OK", "application/json", r#""error""#).await;
        let api = HttpPortholeApi::new(root, None).expect("client");

        let info = api.schema_info("sales").await.expect("schema info");
        assert!(matches!(info, SchemaInfo::Unavailable(_)));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn submit_query_posts_form_and_reads_names() {
        let (root, server) = serve_once("200 OK", "application/json", r#"["daily","weekly"]"#).await;
        let api = HttpPortholeApi::new(root, None).expect("client");

        let names = api
            .submit_query(&QuerySubmission::save("weekly", "SELECT 7"))
            .await
            .expect("submit query");
        assert_eq!(names, vec!["daily".to_string(), "weekly".to_string()]);

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /api/queries/weekly HTTP/1.1"));
        assert!(request.contains("raw_sql=SELECT+7&query_name=weekly&delete_query=No"));
    }

    #[tokio::test]
    async fn connection_delete_posts_to_config() {
        let (root, server) = serve_once("200 OK", "text/html", "<html></html>").await;
        let api = HttpPortholeApi::new(root, None).expect("client");

        api.submit_connection(&ConnectionSubmission::delete("sales"))
            .await
            .expect("submit connection");

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /config HTTP/1.1"));
        assert!(request.contains("connection_name=sales"));
        assert!(request.contains("delete_connection=True"));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (root, server) = serve_once("500 Internal Server Error", "text/plain", "boom").await;
        let api = HttpPortholeApi::new(root, None).expect("client");

        let err = api.list_queries().await.expect_err("500 should fail");
        assert_eq!(err, ApiError::Status { status: 500 });
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let root = format!("http://{}", listener.local_addr().expect("local addr"));
        drop(listener);

        let api = HttpPortholeApi::new(root, None).expect("client");
        let err = api.load_config().await.expect_err("nothing is listening");
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
