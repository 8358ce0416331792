//! Process-local backends used by the test suite and by `serve` when no
//! hosted backend is configured. Data lives only as long as the process.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{
    Class, Grade, LearningObjective, ObjectiveResult, Outcome, Student, StudentOutcomes,
};
use crate::services::{AuthApi, AuthUser, GradebookStore, Role, Session};

#[derive(Default)]
struct Tables {
    next_id: i64,
    classes: Vec<Class>,
    students: Vec<Student>,
    objectives: Vec<LearningObjective>,
    grades: Vec<Grade>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// [`GradebookStore`] over in-process tables, with the same uniqueness
/// rules the hosted schema enforces.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    /// Number of stored grade rows across all classes.
    pub fn grade_count(&self) -> usize {
        self.tables.lock().map_or(0, |t| t.grades.len())
    }

    /// Number of stored student rows across all classes.
    pub fn student_count(&self) -> usize {
        self.tables.lock().map_or(0, |t| t.students.len())
    }
}

#[async_trait]
impl GradebookStore for MemoryStore {
    async fn create_class(&self, instructor_id: &str, name: &str) -> Result<Class> {
        let mut tables = self.tables()?;
        let class = Class {
            id: tables.next_id(),
            name: name.to_string(),
            instructor_id: instructor_id.to_string(),
        };
        tables.classes.push(class.clone());
        Ok(class)
    }

    async fn find_class(&self, class_id: i64) -> Result<Option<Class>> {
        let tables = self.tables()?;
        Ok(tables.classes.iter().find(|c| c.id == class_id).cloned())
    }

    async fn list_classes(&self, instructor_id: &str) -> Result<Vec<Class>> {
        let tables = self.tables()?;
        Ok(tables
            .classes
            .iter()
            .filter(|c| c.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn find_student(&self, class_id: i64, student_number: &str) -> Result<Option<Student>> {
        let tables = self.tables()?;
        Ok(tables
            .students
            .iter()
            .find(|s| s.class_id == class_id && s.student_number == student_number)
            .cloned())
    }

    async fn insert_student(
        &self,
        class_id: i64,
        student_number: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<i64> {
        let mut tables = self.tables()?;
        if tables
            .students
            .iter()
            .any(|s| s.class_id == class_id && s.student_number == student_number)
        {
            bail!("duplicate student number {student_number} in class {class_id}");
        }
        let id = tables.next_id();
        tables.students.push(Student {
            id,
            class_id,
            name: name.to_string(),
            student_number: student_number.to_string(),
            email: email.map(str::to_string),
        });
        Ok(id)
    }

    async fn set_student_email(&self, student_id: i64, email: &str) -> Result<()> {
        let mut tables = self.tables()?;
        let student = tables
            .students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| anyhow!("student {student_id} not found"))?;
        student.email = Some(email.to_string());
        Ok(())
    }

    async fn is_enrolled(&self, class_id: i64, email: &str) -> Result<bool> {
        let tables = self.tables()?;
        Ok(tables
            .students
            .iter()
            .any(|s| s.class_id == class_id && s.email.as_deref() == Some(email)))
    }

    async fn find_objective(&self, class_id: i64, name: &str) -> Result<Option<LearningObjective>> {
        let tables = self.tables()?;
        Ok(tables
            .objectives
            .iter()
            .find(|o| o.class_id == class_id && o.name == name)
            .cloned())
    }

    async fn insert_objective(&self, class_id: i64, name: &str) -> Result<i64> {
        let mut tables = self.tables()?;
        if tables
            .objectives
            .iter()
            .any(|o| o.class_id == class_id && o.name == name)
        {
            bail!("duplicate objective {name} in class {class_id}");
        }
        let id = tables.next_id();
        tables.objectives.push(LearningObjective {
            id,
            class_id,
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn list_objectives(&self, class_id: i64) -> Result<Vec<LearningObjective>> {
        let tables = self.tables()?;
        Ok(tables
            .objectives
            .iter()
            .filter(|o| o.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn find_grade(&self, student_id: i64, objective_id: i64) -> Result<Option<Grade>> {
        let tables = self.tables()?;
        Ok(tables
            .grades
            .iter()
            .find(|g| g.student_id == student_id && g.learning_objective_id == objective_id)
            .cloned())
    }

    async fn insert_grade(
        &self,
        student_id: i64,
        objective_id: i64,
        top: Outcome,
        second: Outcome,
    ) -> Result<i64> {
        let mut tables = self.tables()?;
        if tables
            .grades
            .iter()
            .any(|g| g.student_id == student_id && g.learning_objective_id == objective_id)
        {
            bail!("duplicate grade for student {student_id} on objective {objective_id}");
        }
        let id = tables.next_id();
        tables.grades.push(Grade {
            id,
            student_id,
            learning_objective_id: objective_id,
            top_score: top,
            second_score: second,
        });
        Ok(id)
    }

    async fn update_grade(&self, grade_id: i64, top: Outcome, second: Outcome) -> Result<()> {
        let mut tables = self.tables()?;
        let grade = tables
            .grades
            .iter_mut()
            .find(|g| g.id == grade_id)
            .ok_or_else(|| anyhow!("grade {grade_id} not found"))?;
        grade.top_score = top;
        grade.second_score = second;
        Ok(())
    }

    async fn class_outcomes(&self, class_id: i64) -> Result<Vec<StudentOutcomes>> {
        let tables = self.tables()?;
        let names: HashMap<i64, &str> = tables
            .objectives
            .iter()
            .filter(|o| o.class_id == class_id)
            .map(|o| (o.id, o.name.as_str()))
            .collect();

        Ok(tables
            .students
            .iter()
            .filter(|s| s.class_id == class_id)
            .map(|s| StudentOutcomes {
                student_id: s.id,
                name: s.name.clone(),
                student_number: s.student_number.clone(),
                outcomes: tables
                    .grades
                    .iter()
                    .filter(|g| g.student_id == s.id)
                    .filter_map(|g| {
                        names.get(&g.learning_objective_id).map(|name| ObjectiveResult {
                            objective: (*name).to_string(),
                            top_score: g.top_score,
                            second_score: g.second_score,
                        })
                    })
                    .collect(),
            })
            .collect())
    }
}

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Default)]
struct Accounts {
    users: Vec<(AuthUser, String)>,
    tokens: HashMap<String, String>,
    issued: u64,
}

/// [`AuthApi`] that keeps accounts and tokens in memory. Mirrors the hosted
/// service's messages for the common failures.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<Accounts>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> Result<MutexGuard<'_, Accounts>> {
        self.accounts
            .lock()
            .map_err(|_| anyhow!("in-memory auth lock poisoned"))
    }
}

#[async_trait]
impl AuthApi for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str, role: Role) -> Result<AuthUser> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            bail!("Unable to validate email address: invalid format");
        }
        if password.len() < MIN_PASSWORD_LEN {
            bail!("Password should be at least {MIN_PASSWORD_LEN} characters.");
        }

        let mut accounts = self.accounts()?;
        if accounts.users.iter().any(|(u, _)| u.email == email) {
            bail!("User already registered");
        }
        let user = AuthUser {
            id: format!("user-{}", accounts.users.len() + 1),
            email,
            role,
        };
        accounts.users.push((user.clone(), password.to_string()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        let mut accounts = self.accounts()?;
        let user = accounts
            .users
            .iter()
            .find(|(u, p)| u.email == email && p == password)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| anyhow!("Invalid login credentials"))?;

        accounts.issued += 1;
        let access_token = format!("mem-token-{}-{}", user.id, accounts.issued);
        accounts.tokens.insert(access_token.clone(), user.id.clone());
        Ok(Session { access_token, user })
    }

    async fn user_for_token(&self, access_token: &str) -> Result<AuthUser> {
        let accounts = self.accounts()?;
        let user_id = accounts
            .tokens
            .get(access_token)
            .ok_or_else(|| anyhow!("invalid or expired access token"))?;
        accounts
            .users
            .iter()
            .find(|(u, _)| &u.id == user_id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| anyhow!("user {user_id} no longer exists"))
    }
}
