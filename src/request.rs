//! request descriptors
//!
//! a [`Request`] describes one logical call: a rest endpoint or a graphql
//! document, its parameters, the estimated point cost, and the experimental
//! api flags to send. it is immutable once built and is re-sent unchanged on
//! every retry.

use crate::error::{Error, Result};
use graphql_parser::query::{parse_query, Definition, OperationDefinition};
use reqwest::Method;
use serde_json::{Map, Value};

/// what the request targets
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// rest endpoint relative to the base url
    Rest {
        method: Method,
        path: String,
        /// query parameters, keys unique, order kept
        query: Vec<(String, String)>,
        body: Option<Value>,
    },
    /// graphql document posted to the graphql endpoint
    GraphQl {
        query: String,
        /// variables, keys unique, order kept
        variables: Map<String, Value>,
        operation_name: Option<String>,
    },
}

/// one logical call
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    target: Target,
    cost: u32,
    experimental_apis: Vec<String>,
}

impl Request {
    /// start a rest `GET`
    pub fn get(path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::rest(Method::GET, path.into())
    }

    /// start a rest `POST`
    pub fn post(path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::rest(Method::POST, path.into())
    }

    /// start a rest `PUT`
    pub fn put(path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::rest(Method::PUT, path.into())
    }

    /// start a rest `DELETE`
    pub fn delete(path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::rest(Method::DELETE, path.into())
    }

    /// start a graphql request
    pub fn graphql(query: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            target: Target::GraphQl {
                query: query.into(),
                variables: Map::new(),
                operation_name: None,
            },
            cost: 1,
            experimental_apis: Vec::new(),
            rejected: None,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// estimated point cost (at least 1)
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// experimental api flags, in send order
    pub fn experimental_apis(&self) -> &[String] {
        &self.experimental_apis
    }

    /// graphql operation name, if set
    pub fn operation_name(&self) -> Option<&str> {
        match &self.target {
            Target::GraphQl { operation_name, .. } => operation_name.as_deref(),
            Target::Rest { .. } => None,
        }
    }

    pub fn is_graphql(&self) -> bool {
        matches!(self.target, Target::GraphQl { .. })
    }

    /// http method used on the wire
    pub fn method(&self) -> Method {
        match &self.target {
            Target::Rest { method, .. } => method.clone(),
            Target::GraphQl { .. } => Method::POST,
        }
    }

    /// short name for logs: the operation name or `METHOD path`
    pub fn label(&self) -> String {
        match &self.target {
            Target::GraphQl {
                operation_name: Some(name),
                ..
            } => name.clone(),
            Target::GraphQl { .. } => "graphql".to_string(),
            Target::Rest { method, path, .. } => format!("{method} {path}"),
        }
    }

    /// json body for the wire, if any
    pub(crate) fn body(&self) -> Option<Value> {
        match &self.target {
            Target::Rest { body, .. } => body.clone(),
            Target::GraphQl {
                query,
                variables,
                operation_name,
            } => {
                let mut body = Map::new();
                body.insert("query".to_string(), Value::String(query.clone()));
                body.insert("variables".to_string(), Value::Object(variables.clone()));
                if let Some(name) = operation_name {
                    body.insert("operationName".to_string(), Value::String(name.clone()));
                }
                Some(Value::Object(body))
            }
        }
    }
}

/// builder for [`Request`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    target: Target,
    cost: u32,
    experimental_apis: Vec<String>,
    /// first rejected input, reported by `build`
    rejected: Option<String>,
}

impl RequestBuilder {
    fn rest(method: Method, path: String) -> Self {
        Self {
            target: Target::Rest {
                method,
                path,
                query: Vec::new(),
                body: None,
            },
            cost: 1,
            experimental_apis: Vec::new(),
            rejected: None,
        }
    }

    /// set a query parameter; a repeated key replaces the earlier value in place
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        if let Target::Rest { query, .. } = &mut self.target {
            let key = key.into();
            let value = value.to_string();
            match query.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => query.push((key, value)),
            }
        }
        self
    }

    /// set a json body (rest only)
    pub fn json(mut self, value: Value) -> Self {
        if let Target::Rest { body, .. } = &mut self.target {
            *body = Some(value);
        }
        self
    }

    /// set a graphql variable; a repeated key replaces the earlier value
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Target::GraphQl { variables, .. } = &mut self.target {
            variables.insert(key.into(), value.into());
        }
        self
    }

    /// merge a variables object; `null` adds nothing, any other non-object
    /// makes `build` fail
    pub fn variables(mut self, values: Value) -> Self {
        let Target::GraphQl { variables, .. } = &mut self.target else {
            return self;
        };
        match values {
            Value::Object(values) => {
                for (key, value) in values {
                    variables.insert(key, value);
                }
            }
            Value::Null => {}
            other => {
                self.rejected.get_or_insert_with(|| {
                    format!("graphql variables must be a json object, got {other}")
                });
            }
        }
        self
    }

    /// set the graphql operation name
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        if let Target::GraphQl { operation_name, .. } = &mut self.target {
            *operation_name = Some(name.into());
        }
        self
    }

    /// declare the estimated point cost (default 1)
    pub fn cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// add an experimental api flag; duplicates are dropped
    pub fn experimental_api(mut self, flag: impl Into<String>) -> Self {
        let flag = flag.into();
        if !self.experimental_apis.contains(&flag) {
            self.experimental_apis.push(flag);
        }
        self
    }

    /// add several experimental api flags in order
    pub fn experimental_apis<I, S>(self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        flags
            .into_iter()
            .fold(self, |builder, flag| builder.experimental_api(flag))
    }

    /// validate and freeze the request
    pub fn build(self) -> Result<Request> {
        if let Some(reason) = self.rejected {
            return Err(Error::InvalidArgument(reason));
        }
        if self.cost == 0 {
            return Err(Error::InvalidArgument(
                "estimated cost must be positive".to_string(),
            ));
        }
        if let Some(flag) = self
            .experimental_apis
            .iter()
            .find(|flag| flag.trim().is_empty())
        {
            return Err(Error::InvalidArgument(format!(
                "experimental api flag must be non-empty: {flag:?}"
            )));
        }

        match &self.target {
            Target::Rest { path, .. } => {
                if !path.starts_with('/') {
                    return Err(Error::InvalidArgument(format!(
                        "rest path must start with '/': {path}"
                    )));
                }
            }
            Target::GraphQl {
                query,
                operation_name,
                ..
            } => {
                if query.trim().is_empty() {
                    return Err(Error::InvalidArgument(
                        "graphql query cannot be empty".to_string(),
                    ));
                }
                if let Some(name) = operation_name {
                    ensure_operation_defined(query, name)?;
                }
            }
        }

        Ok(Request {
            target: self.target,
            cost: self.cost,
            experimental_apis: self.experimental_apis,
        })
    }
}

fn ensure_operation_defined(query: &str, name: &str) -> Result<()> {
    let document = parse_query::<&str>(query)
        .map_err(|err| Error::InvalidArgument(format!("invalid graphql document: {err}")))?;

    let defined = document.definitions.iter().any(|definition| {
        let operation_name = match definition {
            Definition::Operation(OperationDefinition::Query(op)) => op.name,
            Definition::Operation(OperationDefinition::Mutation(op)) => op.name,
            Definition::Operation(OperationDefinition::Subscription(op)) => op.name,
            _ => None,
        };
        operation_name == Some(name)
    });

    if !defined {
        return Err(Error::InvalidArgument(format!(
            "operation {name} is not defined in the graphql document"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SPRINT_QUERY: &str = "query JiraSprintById($id: ID!) { sprintById(id: $id) { name } }";

    #[test]
    fn test_rest_query_keys_unique_and_ordered() {
        let request = Request::get("/rest/agile/1.0/board")
            .query("startAt", 0)
            .query("maxResults", 50)
            .query("startAt", 50)
            .build()
            .unwrap();
        match request.target() {
            Target::Rest { query, .. } => assert_eq!(
                query,
                &vec![
                    ("startAt".to_string(), "50".to_string()),
                    ("maxResults".to_string(), "50".to_string())
                ]
            ),
            other => panic!("unexpected target {other:?}"),
        }
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.label(), "GET /rest/agile/1.0/board");
        assert_eq!(request.cost(), 1);
    }

    #[test]
    fn test_graphql_body_shape() {
        let request = Request::graphql(SPRINT_QUERY)
            .variable("id", "42")
            .variable("after", Value::Null)
            .operation_name("JiraSprintById")
            .cost(3)
            .experimental_apis(["JiraSprint", "JiraSprint", "Other"])
            .build()
            .unwrap();

        assert_eq!(
            request.body().unwrap(),
            json!({
                "query": SPRINT_QUERY,
                "variables": {"id": "42", "after": null},
                "operationName": "JiraSprintById"
            })
        );
        assert_eq!(request.cost(), 3);
        assert_eq!(request.experimental_apis(), ["JiraSprint", "Other"]);
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.label(), "JiraSprintById");
    }

    #[test]
    fn test_variables_keep_insertion_order() {
        let request = Request::graphql("{ ok }")
            .variables(json!({"zeta": 1, "alpha": 2}))
            .variable("zeta", 3)
            .build()
            .unwrap();
        let body = request.body().unwrap();
        let keys: Vec<_> = body["variables"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(body["variables"]["zeta"], 3);
        assert!(body.get("operationName").is_none());
    }

    #[test]
    fn test_build_validation() {
        assert!(matches!(
            Request::get("/x").cost(0).build(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Request::get("no-slash").build().is_err());
        assert!(Request::graphql("  ").build().is_err());
        assert!(Request::get("/x").experimental_api(" ").build().is_err());
        assert!(Request::graphql(SPRINT_QUERY)
            .operation_name("Other")
            .build()
            .is_err());
        assert!(Request::graphql("query {")
            .operation_name("Broken")
            .build()
            .is_err());
        // documents are only parsed when an operation name is given
        assert!(Request::graphql("query {").build().is_ok());
    }

    #[test]
    fn test_non_object_variables_rejected() {
        let err = Request::graphql("{ ok }")
            .variables(json!(["cloud-1", "A-1"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(m) if m.contains("json object")));

        assert!(Request::graphql("{ ok }").variables(json!("A-1")).build().is_err());

        let request = Request::graphql("{ ok }")
            .variables(serde_json::Value::Null)
            .build()
            .unwrap();
        assert!(request.body().unwrap()["variables"]
            .as_object()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rest_body() {
        let request = Request::post("/rest/api/3/version")
            .json(json!({"name": "1.0"}))
            .variable("ignored", 1)
            .build()
            .unwrap();
        assert_eq!(request.body(), Some(json!({"name": "1.0"})));
        assert!(request.operation_name().is_none());
        assert!(!request.is_graphql());
    }
}
