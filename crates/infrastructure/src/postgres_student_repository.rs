use ardoise_core::{AppError, AppResult, SchoolId};
use ardoise_domain::{Student, StudentInput};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed student roster used by the demonstration API routes.
#[derive(Clone)]
pub struct PostgresStudentRepository {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct StudentRow {
    id: String,
    school_id: String,
    first_name: String,
    last_name: String,
    id_number: Option<String>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            school_id: SchoolId::new(row.school_id),
            first_name: row.first_name,
            last_name: row.last_name,
            id_number: row.id_number,
        }
    }
}

impl PostgresStudentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists students enrolled in a school.
    pub async fn list_for_school(&self, school_id: &SchoolId) -> AppResult<Vec<Student>> {
        let rows = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, school_id, first_name, last_name, id_number
            FROM students
            WHERE school_id = $1
            ORDER BY last_name, first_name
            LIMIT 200
            "#,
        )
        .bind(school_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list students: {error}")))?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    /// Returns one student by identifier, scoped to a school.
    pub async fn find(&self, school_id: &SchoolId, student_id: &str) -> AppResult<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, school_id, first_name, last_name, id_number
            FROM students
            WHERE school_id = $1 AND id = $2
            "#,
        )
        .bind(school_id.as_str())
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load student: {error}")))?;

        Ok(row.map(Student::from))
    }

    /// Creates a student and returns the stored record.
    pub async fn create(&self, school_id: &SchoolId, input: StudentInput) -> AppResult<Student> {
        let student = Student {
            id: uuid::Uuid::new_v4().to_string(),
            school_id: school_id.clone(),
            first_name: input.first_name,
            last_name: input.last_name,
            id_number: input.id_number,
        };

        sqlx::query(
            r#"
            INSERT INTO students (id, school_id, first_name, last_name, id_number)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(student.id.as_str())
        .bind(student.school_id.as_str())
        .bind(student.first_name.as_str())
        .bind(student.last_name.as_str())
        .bind(student.id_number.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create student: {error}")))?;

        Ok(student)
    }

    /// Updates a student and returns the new record, or `None` when missing.
    pub async fn update(
        &self,
        school_id: &SchoolId,
        student_id: &str,
        input: StudentInput,
    ) -> AppResult<Option<Student>> {
        let updated = sqlx::query(
            r#"
            UPDATE students
            SET first_name = $3, last_name = $4, id_number = $5, updated_at = now()
            WHERE school_id = $1 AND id = $2
            "#,
        )
        .bind(school_id.as_str())
        .bind(student_id)
        .bind(input.first_name.as_str())
        .bind(input.last_name.as_str())
        .bind(input.id_number.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update student: {error}")))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        self.find(school_id, student_id).await
    }

    /// Deletes a student and returns the removed record, or `None` when missing.
    pub async fn delete(
        &self,
        school_id: &SchoolId,
        student_id: &str,
    ) -> AppResult<Option<Student>> {
        let Some(existing) = self.find(school_id, student_id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM students WHERE school_id = $1 AND id = $2")
            .bind(school_id.as_str())
            .bind(student_id)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete student: {error}")))?;

        Ok(Some(existing))
    }
}
