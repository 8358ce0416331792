use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BackendConfig;
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, send, send_json};
use crate::models::{
    Class, Grade, LearningObjective, ObjectiveResult, Outcome, Student, StudentOutcomes,
};
use crate::services::GradebookStore;

const PREFER: &str = "prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Stored form of an outcome slot: unset slots are `NULL`.
fn column(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Unset => None,
        other => Some(other.as_str()),
    }
}

fn outcome(column: Option<&str>) -> Outcome {
    column.map(Outcome::from_cell).unwrap_or_default()
}

#[derive(Serialize)]
struct NewClass<'a> {
    name: &'a str,
    instructor_id: &'a str,
}

#[derive(Serialize)]
struct NewStudent<'a> {
    class_id: i64,
    student_number: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Serialize)]
struct StudentEmail<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct NewObjective<'a> {
    class_id: i64,
    name: &'a str,
}

#[derive(Serialize)]
struct GradeScores {
    top_score: Option<&'static str>,
    second_score: Option<&'static str>,
}

#[derive(Serialize)]
struct NewGrade {
    student_id: i64,
    learning_objective_id: i64,
    #[serde(flatten)]
    scores: GradeScores,
}

#[derive(Deserialize)]
struct IdRow {
    id: i64,
}

#[derive(Deserialize)]
struct GradeRow {
    id: i64,
    student_id: i64,
    learning_objective_id: i64,
    top_score: Option<String>,
    second_score: Option<String>,
}

impl From<GradeRow> for Grade {
    fn from(row: GradeRow) -> Self {
        Grade {
            id: row.id,
            student_id: row.student_id,
            learning_objective_id: row.learning_objective_id,
            top_score: outcome(row.top_score.as_deref()),
            second_score: outcome(row.second_score.as_deref()),
        }
    }
}

#[derive(Deserialize)]
struct ObjectiveName {
    name: String,
}

#[derive(Deserialize)]
struct JoinedGrade {
    id: i64,
    top_score: Option<String>,
    second_score: Option<String>,
    learning_objectives: Option<ObjectiveName>,
}

#[derive(Deserialize)]
struct JoinedStudent {
    id: i64,
    name: String,
    student_number: String,
    #[serde(default)]
    grades: Vec<JoinedGrade>,
}

const CLASS_OUTCOMES_SELECT: &str =
    "id,name,student_number,grades(id,top_score,second_score,learning_objectives(name))";

/// [`GradebookStore`] backed by a PostgREST-style REST API
/// (`<url>/rest/v1/<table>`).
pub struct RestStore<C> {
    base_url: Url,
    client: C,
}

impl RestStore<ApiKey<BasicClient>> {
    /// Connects with the project key sent as both `apikey` and bearer token.
    pub fn connect(config: &BackendConfig) -> Result<Self> {
        let client = ApiKey::service_key(BasicClient::new(config.timeout)?, &config.key)?;
        Self::with_client(&config.url, client)
    }
}

impl<C: HttpClient> RestStore<C> {
    pub fn with_client(base_url: &str, client: C) -> Result<Self> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).with_context(|| format!("invalid backend URL '{base_url}'"))?;
        Ok(Self { base_url, client })
    }

    fn request(&self, method: Method, table: &str, query: &[(&str, String)]) -> Result<Request> {
        let mut url = self.base_url.join(&format!("rest/v1/{table}"))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let mut req = Request::new(method, url);
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(req)
    }

    fn with_body(mut req: Request, body: &impl Serialize) -> Result<Request> {
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(serde_json::to_vec(body)?.into());
        Ok(req)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let req = self.request(Method::GET, table, query)?;
        send_json(&self.client, req).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let mut query = query.to_vec();
        query.push(("limit", "1".to_string()));
        let rows: Vec<T> = self.select(table, &query).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts one row and returns the stored representation.
    async fn insert<R: DeserializeOwned>(&self, table: &str, row: &impl Serialize) -> Result<R> {
        let mut req = Self::with_body(self.request(Method::POST, table, &[])?, row)?;
        req.headers_mut()
            .insert(PREFER, HeaderValue::from_static(RETURN_REPRESENTATION));

        let rows: Vec<R> = send_json(&self.client, req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("insert into {table} returned no row"))
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl<C: HttpClient> GradebookStore for RestStore<C> {
    async fn create_class(&self, instructor_id: &str, name: &str) -> Result<Class> {
        self.insert("classes", &NewClass {
            name,
            instructor_id,
        })
        .await
    }

    async fn find_class(&self, class_id: i64) -> Result<Option<Class>> {
        self.select_one("classes", &[("id", eq(class_id))]).await
    }

    async fn list_classes(&self, instructor_id: &str) -> Result<Vec<Class>> {
        self.select(
            "classes",
            &[
                ("instructor_id", eq(instructor_id)),
                ("order", "id.asc".to_string()),
            ],
        )
        .await
    }

    async fn find_student(&self, class_id: i64, student_number: &str) -> Result<Option<Student>> {
        self.select_one(
            "students",
            &[
                ("class_id", eq(class_id)),
                ("student_number", eq(student_number)),
            ],
        )
        .await
    }

    async fn insert_student(
        &self,
        class_id: i64,
        student_number: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<i64> {
        let row: IdRow = self
            .insert("students", &NewStudent {
                class_id,
                student_number,
                name,
                email,
            })
            .await?;
        Ok(row.id)
    }

    async fn set_student_email(&self, student_id: i64, email: &str) -> Result<()> {
        let req = self.request(Method::PATCH, "students", &[("id", eq(student_id))])?;
        let req = Self::with_body(req, &StudentEmail { email })?;
        send(&self.client, req).await?;
        Ok(())
    }

    async fn is_enrolled(&self, class_id: i64, email: &str) -> Result<bool> {
        let row: Option<IdRow> = self
            .select_one(
                "students",
                &[
                    ("select", "id".to_string()),
                    ("class_id", eq(class_id)),
                    ("email", eq(email)),
                ],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn find_objective(&self, class_id: i64, name: &str) -> Result<Option<LearningObjective>> {
        self.select_one(
            "learning_objectives",
            &[("class_id", eq(class_id)), ("name", eq(name))],
        )
        .await
    }

    async fn insert_objective(&self, class_id: i64, name: &str) -> Result<i64> {
        let row: IdRow = self
            .insert("learning_objectives", &NewObjective { class_id, name })
            .await?;
        Ok(row.id)
    }

    async fn list_objectives(&self, class_id: i64) -> Result<Vec<LearningObjective>> {
        self.select(
            "learning_objectives",
            &[("class_id", eq(class_id)), ("order", "id.asc".to_string())],
        )
        .await
    }

    async fn find_grade(&self, student_id: i64, objective_id: i64) -> Result<Option<Grade>> {
        let row: Option<GradeRow> = self
            .select_one(
                "grades",
                &[
                    ("student_id", eq(student_id)),
                    ("learning_objective_id", eq(objective_id)),
                ],
            )
            .await?;
        Ok(row.map(Grade::from))
    }

    async fn insert_grade(
        &self,
        student_id: i64,
        objective_id: i64,
        top: Outcome,
        second: Outcome,
    ) -> Result<i64> {
        let row: IdRow = self
            .insert("grades", &NewGrade {
                student_id,
                learning_objective_id: objective_id,
                scores: GradeScores {
                    top_score: column(top),
                    second_score: column(second),
                },
            })
            .await?;
        Ok(row.id)
    }

    async fn update_grade(&self, grade_id: i64, top: Outcome, second: Outcome) -> Result<()> {
        let req = self.request(Method::PATCH, "grades", &[("id", eq(grade_id))])?;
        let req = Self::with_body(req, &GradeScores {
            top_score: column(top),
            second_score: column(second),
        })?;
        send(&self.client, req).await?;
        Ok(())
    }

    async fn class_outcomes(&self, class_id: i64) -> Result<Vec<StudentOutcomes>> {
        let rows: Vec<JoinedStudent> = self
            .select(
                "students",
                &[
                    ("select", CLASS_OUTCOMES_SELECT.to_string()),
                    ("class_id", eq(class_id)),
                    ("order", "id.asc".to_string()),
                ],
            )
            .await?;
        debug!(class_id, students = rows.len(), "Fetched class outcomes");

        Ok(rows
            .into_iter()
            .map(|mut student| {
                student.grades.sort_by_key(|g| g.id);
                StudentOutcomes {
                    student_id: student.id,
                    name: student.name,
                    student_number: student.student_number,
                    outcomes: student
                        .grades
                        .into_iter()
                        .filter_map(|g| {
                            let objective = g.learning_objectives?.name;
                            Some(ObjectiveResult {
                                objective,
                                top_score: outcome(g.top_score.as_deref()),
                                second_score: outcome(g.second_score.as_deref()),
                            })
                        })
                        .collect(),
                }
            })
            .collect())
    }
}
