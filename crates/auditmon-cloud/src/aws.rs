//! SigV4-signed EC2 query-API implementation of [`ComputeApi`].

use crate::error::{ComputeApiError, Result};
use crate::{ComputeApi, ComputeInstance, InstancePage};
use async_trait::async_trait;
use auditmon_common::sigv4::{sign_request, Credentials};
use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

const EC2_VERSION: &str = "2016-11-15";
const QUERY_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

pub struct AwsComputeApi {
    client: Client,
    credentials: Credentials,
    region: String,
}

impl AwsComputeApi {
    pub fn new(region: &str, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            credentials,
            region: region.to_string(),
        })
    }

    async fn call(&self, params: &[(&str, String)]) -> Result<String> {
        let host = format!("ec2.{}.amazonaws.com", self.region);
        let payload = form_encode(params);

        let signature = sign_request(
            &self.credentials,
            "ec2",
            &self.region,
            &host,
            QUERY_CONTENT_TYPE,
            &payload,
            Utc::now().timestamp(),
        )?;

        let url = format!("https://{}/", host);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", QUERY_CONTENT_TYPE)
            .header("Host", &host)
            .header("X-Amz-Date", &signature.amz_date)
            .header("Authorization", &signature.authorization)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ComputeApiError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ComputeApi for AwsComputeApi {
    async fn describe_instances(&self, next_token: Option<&str>) -> anyhow::Result<InstancePage> {
        let mut params = vec![
            ("Action", "DescribeInstances".to_string()),
            ("Version", EC2_VERSION.to_string()),
        ];
        if let Some(token) = next_token {
            params.push(("NextToken", token.to_string()));
        }

        let body = self.call(&params).await?;
        Ok(parse_describe_instances(&body)?)
    }

    async fn describe_running_instances(&self) -> anyhow::Result<Vec<ComputeInstance>> {
        let params = vec![
            ("Action", "DescribeInstances".to_string()),
            ("Version", EC2_VERSION.to_string()),
            ("Filter.1.Name", "instance-state-name".to_string()),
            ("Filter.1.Value.1", "running".to_string()),
        ];

        let body = self.call(&params).await?;
        let page = parse_describe_instances(&body)?;
        Ok(page.instances)
    }
}

fn form_encode(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

#[derive(Default)]
struct PendingInstance {
    instance_id: String,
    instance_type: String,
    state: String,
}

fn path_ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path
            .iter()
            .rev()
            .zip(suffix.iter().rev())
            .all(|(a, b)| a == b)
}

/// Parse a DescribeInstances XML response. Instances live at
/// `reservationSet/item/instancesSet/item`; the element path is tracked so
/// the `item` and `name` elements of other sets (security groups, placement)
/// are not mistaken for instance fields.
fn parse_describe_instances(xml: &str) -> Result<InstancePage> {
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<String> = Vec::new();
    let mut pending: Option<PendingInstance> = None;
    let mut page = InstancePage::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "item" && path_ends_with(&path, &["reservationSet", "item", "instancesSet"]) {
                    pending = Some(PendingInstance::default());
                }
                path.push(name);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ComputeApiError::MalformedResponse(e.to_string()))?
                    .trim()
                    .to_string();
                if text.is_empty() {
                    continue;
                }
                if let Some(instance) = pending.as_mut() {
                    if path_ends_with(&path, &["instancesSet", "item", "instanceId"]) {
                        instance.instance_id = text;
                    } else if path_ends_with(&path, &["instancesSet", "item", "instanceType"]) {
                        instance.instance_type = text;
                    } else if path_ends_with(&path, &["instancesSet", "item", "instanceState", "name"])
                    {
                        instance.state = text;
                    }
                } else if path_ends_with(&path, &["DescribeInstancesResponse", "nextToken"]) {
                    page.next_token = Some(text);
                }
            }
            Ok(Event::End(_)) => {
                if path_ends_with(&path, &["reservationSet", "item", "instancesSet", "item"]) {
                    if let Some(instance) = pending.take() {
                        page.instances.push(ComputeInstance {
                            instance_id: instance.instance_id,
                            instance_type: instance.instance_type,
                            state: instance.state,
                        });
                    }
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ComputeApiError::MalformedResponse(e.to_string())),
            _ => {}
        }
    }

    Ok(page)
}
