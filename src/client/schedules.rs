use crate::error::Error;
use crate::models::client::{
    CreateSchedule, CreateScheduleTask, Schedule, ScheduleTask, UpdateSchedule, UpdateScheduleTask,
};
use crate::net::api::{HttpClient, Mutation, NO_BODY};

#[derive(Clone, Debug)]
pub struct ScheduleApi<'a> {
    http: &'a HttpClient,
    base: String,
}

impl<'a> ScheduleApi<'a> {
    pub(crate) fn new(http: &'a HttpClient, server_base: &str) -> Self {
        Self {
            http,
            base: format!("{server_base}/schedules"),
        }
    }

    pub async fn list(&self) -> Result<Vec<Schedule>, Error> {
        let page = self.http.fetch_list(&self.base, None).await?;
        Ok(page.data)
    }

    pub async fn get(&self, schedule_id: u64) -> Result<Schedule, Error> {
        self.http
            .fetch_one(&format!("{}/{schedule_id}", self.base), None)
            .await
    }

    pub async fn create(&self, params: &CreateSchedule) -> Result<Schedule, Error> {
        self.http
            .mutate_one(Mutation::Create, &self.base, Some(params))
            .await
    }

    /// Schedules are updated with `POST`, not `PATCH`.
    pub async fn update(&self, schedule_id: u64, params: &UpdateSchedule) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &format!("{}/{schedule_id}", self.base), Some(params))
            .await
    }

    pub async fn delete(&self, schedule_id: u64) -> Result<(), Error> {
        self.http
            .remove(&format!("{}/{schedule_id}", self.base), NO_BODY)
            .await
    }

    /// Run the schedule now regardless of its cron expression.
    pub async fn execute(&self, schedule_id: u64) -> Result<(), Error> {
        self.http
            .execute(Mutation::Create, &format!("{}/{schedule_id}/execute", self.base), NO_BODY)
            .await
    }

    pub async fn create_task(&self, schedule_id: u64, params: &CreateScheduleTask) -> Result<ScheduleTask, Error> {
        self.http
            .mutate_one(Mutation::Create, &format!("{}/{schedule_id}/tasks", self.base), Some(params))
            .await
    }

    pub async fn update_task(
        &self,
        schedule_id: u64,
        task_id: u64,
        params: &UpdateScheduleTask,
    ) -> Result<ScheduleTask, Error> {
        self.http
            .mutate_one(
                Mutation::Create,
                &format!("{}/{schedule_id}/tasks/{task_id}", self.base),
                Some(params),
            )
            .await
    }

    pub async fn delete_task(&self, schedule_id: u64, task_id: u64) -> Result<(), Error> {
        self.http
            .remove(&format!("{}/{schedule_id}/tasks/{task_id}", self.base), NO_BODY)
            .await
    }
}
