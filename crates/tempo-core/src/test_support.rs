//! In-memory store used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{RecurringTemplate, TaskInstance};
use crate::repository::{InstanceStore, TemplateStore};

/// Failure to inject into `insert_instance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertFault {
    /// Fail every insert after this many have succeeded.
    UnavailableAfter(usize),
    /// Report the next insert as a uniqueness violation without storing it,
    /// as if another writer got there first.
    DuplicateOnce,
}

#[derive(Default)]
pub struct MemoryStore {
    templates: Mutex<HashMap<Uuid, RecurringTemplate>>,
    instances: Mutex<Vec<TaskInstance>>,
    fault: Mutex<Option<InsertFault>>,
    inserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, fault: InsertFault) {
        *self.fault.lock().unwrap() = Some(fault);
    }

    pub fn instances(&self) -> Vec<TaskInstance> {
        self.instances.lock().unwrap().clone()
    }

    pub fn instance_dates(&self, template_id: Uuid) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.template_id == Some(template_id))
            .map(|i| i.date)
            .collect();
        dates.sort();
        dates
    }

    fn unavailable() -> CoreError {
        CoreError::Database(sqlx::Error::PoolTimedOut)
    }

    fn check_fault(&self, instance: &TaskInstance) -> Result<(), CoreError> {
        let mut fault = self.fault.lock().unwrap();
        match *fault {
            Some(InsertFault::UnavailableAfter(n)) if self.inserts.load(Ordering::SeqCst) >= n => {
                Err(Self::unavailable())
            }
            Some(InsertFault::DuplicateOnce) => {
                *fault = None;
                Err(CoreError::DuplicateInstance {
                    template_id: instance.template_id.unwrap_or_default(),
                    date: instance.date,
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn insert_template(&self, template: &RecurringTemplate) -> Result<RecurringTemplate, CoreError> {
        self.templates.lock().unwrap().insert(template.id, template.clone());
        Ok(template.clone())
    }

    async fn find_template_by_id(&self, id: Uuid) -> Result<Option<RecurringTemplate>, CoreError> {
        Ok(self.templates.lock().unwrap().get(&id).cloned())
    }

    async fn find_templates_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringTemplate>, CoreError> {
        let mut found: Vec<RecurringTemplate> = self
            .templates
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| (t.created_at, t.id));
        Ok(found)
    }

    async fn find_active_templates_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringTemplate>, CoreError> {
        let mut found = self.find_templates_by_owner(owner_id).await?;
        found.retain(|t| t.active);
        Ok(found)
    }

    async fn update_template(&self, template: &RecurringTemplate) -> Result<RecurringTemplate, CoreError> {
        let mut templates = self.templates.lock().unwrap();
        match templates.get_mut(&template.id) {
            Some(stored) => {
                *stored = template.clone();
                Ok(template.clone())
            }
            None => Err(CoreError::NotFound(format!("Template with id {} not found", template.id))),
        }
    }

    async fn delete_template(&self, id: Uuid) -> Result<(), CoreError> {
        if self.templates.lock().unwrap().remove(&id).is_none() {
            return Err(CoreError::NotFound(format!("Template with id {} not found", id)));
        }
        self.instances.lock().unwrap().retain(|i| i.template_id != Some(id));
        Ok(())
    }
}

#[async_trait]
impl InstanceStore for MemoryStore {
    async fn find_instance(&self, template_id: Uuid, date: NaiveDate) -> Result<Option<TaskInstance>, CoreError> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.template_id == Some(template_id) && i.date == date)
            .cloned())
    }

    async fn insert_instance(&self, instance: &TaskInstance) -> Result<TaskInstance, CoreError> {
        self.check_fault(instance)?;

        let mut instances = self.instances.lock().unwrap();
        if let Some(template_id) = instance.template_id {
            if instances
                .iter()
                .any(|i| i.template_id == Some(template_id) && i.date == instance.date)
            {
                return Err(CoreError::DuplicateInstance {
                    template_id,
                    date: instance.date,
                });
            }
        }
        instances.push(instance.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(instance.clone())
    }

    async fn count_instances_on_date(&self, owner_id: Uuid, date: NaiveDate) -> Result<i64, CoreError> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.owner_id == owner_id && i.date == date)
            .count() as i64)
    }

    async fn find_instances_on_date(&self, owner_id: Uuid, date: NaiveDate) -> Result<Vec<TaskInstance>, CoreError> {
        let mut found: Vec<TaskInstance> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.owner_id == owner_id && i.date == date)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.position);
        Ok(found)
    }

    async fn find_instances_for_template(&self, template_id: Uuid) -> Result<Vec<TaskInstance>, CoreError> {
        let mut found: Vec<TaskInstance> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.template_id == Some(template_id))
            .cloned()
            .collect();
        found.sort_by_key(|i| i.date);
        Ok(found)
    }

    async fn delete_instances_for_template(&self, template_id: Uuid) -> Result<u64, CoreError> {
        let mut instances = self.instances.lock().unwrap();
        let before = instances.len();
        instances.retain(|i| i.template_id != Some(template_id));
        let deleted = (before - instances.len()) as u64;

        let mut days: Vec<(Uuid, NaiveDate)> = instances.iter().map(|i| (i.owner_id, i.date)).collect();
        days.sort();
        days.dedup();
        for (owner_id, date) in days {
            let mut on_day: Vec<&mut TaskInstance> = instances
                .iter_mut()
                .filter(|i| i.owner_id == owner_id && i.date == date)
                .collect();
            on_day.sort_by_key(|i| i.position);
            for (position, instance) in on_day.into_iter().enumerate() {
                instance.position = position as i64;
            }
        }
        Ok(deleted)
    }

    async fn set_instance_completed(&self, id: Uuid, completed: bool) -> Result<TaskInstance, CoreError> {
        let mut instances = self.instances.lock().unwrap();
        match instances.iter_mut().find(|i| i.id == id) {
            Some(instance) => {
                instance.completed = completed;
                Ok(instance.clone())
            }
            None => Err(CoreError::NotFound(format!("Task with id {} not found", id))),
        }
    }
}
