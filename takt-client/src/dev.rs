use std::sync::{Arc, Mutex};

use time::{Date, OffsetDateTime};

use crate::domain::{
    self, Category, CategoryBreakdown, CategoryStats, EntryFilter, Session, StatsSummary, Tag,
    TagBreakdown, Task, TopTask,
};
use crate::dto::{NewCategory, NewTask, StartTimerRequest, UpsertEntryRequest};

/// In-memory stand-in for the remote data store, used for offline
/// development and for exercising the engine in tests without a server.
#[derive(Debug, Clone)]
pub(crate) struct DevBackend {
    store: Arc<Mutex<DevStore>>,
}

#[derive(Debug)]
struct DevStore {
    categories: Vec<Category>,
    tasks: Vec<Task>,
    tags: Vec<Tag>,
    entries: Vec<Session>,
    next_entry_id: i64,
    next_category_id: i64,
    next_task_id: i64,
}

impl DevBackend {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(seed_store())),
        }
    }

    pub fn running_session(&self) -> Option<Session> {
        let store = self.store.lock().expect("dev store lock poisoned");
        store.entries.iter().find(|e| e.is_running).cloned()
    }

    /// Starting a timer force-stops any entry still running, exactly like
    /// the backend does, so the single-running-session invariant holds.
    pub fn start_timer(&self, req: &StartTimerRequest) -> Session {
        let now = OffsetDateTime::now_utc();
        let mut store = self.store.lock().expect("dev store lock poisoned");

        for entry in store.entries.iter_mut().filter(|e| e.is_running) {
            entry.end_at = Some(now);
            entry.duration_seconds = (now - entry.start_at).whole_seconds();
            entry.is_running = false;
        }

        let category_name = store.category_path(req.category_id).unwrap_or_default();
        let task_name = req
            .task_id
            .and_then(|id| store.tasks.iter().find(|t| t.id == id))
            .map(|t| t.name.clone());
        let tags = store
            .tags
            .iter()
            .filter(|t| req.tag_ids.contains(&t.id))
            .cloned()
            .collect();

        let entry = Session {
            id: store.next_entry_id,
            category: req.category_id,
            category_name,
            task: req.task_id,
            task_name,
            tags,
            note: req.note.clone(),
            start_at: now,
            end_at: None,
            duration_seconds: 0,
            is_running: true,
        };
        store.next_entry_id += 1;
        store.entries.push(entry.clone());
        entry
    }

    /// Returns `None` when no running entry matches, mirroring the 404 the
    /// backend sends for an unknown or already-stopped timer.
    pub fn stop_timer(&self, entry_id: i64) -> Option<Session> {
        let now = OffsetDateTime::now_utc();
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let entry = store
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.is_running)?;
        entry.end_at = Some(now);
        entry.duration_seconds = (now - entry.start_at).whole_seconds();
        entry.is_running = false;
        Some(entry.clone())
    }

    pub fn sessions(&self, filter: &EntryFilter) -> Vec<Session> {
        let store = self.store.lock().expect("dev store lock poisoned");
        let category_path = filter
            .category
            .filter(|_| filter.include_descendants)
            .and_then(|id| store.category_path(id));

        let mut list: Vec<Session> = store
            .entries
            .iter()
            .filter(|e| match (&category_path, filter.category) {
                (Some(path), _) => e.category_name.starts_with(path.as_str()),
                (None, Some(id)) => e.category == id,
                (None, None) => true,
            })
            .filter(|e| match &filter.tag {
                Some(tag) => e.tags.iter().any(|t| &t.name == tag),
                None => true,
            })
            .filter(|e| filter.from.map_or(true, |from| e.start_at.date() >= from))
            .filter(|e| filter.to.map_or(true, |to| e.start_at.date() <= to))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.start_at.cmp(&a.start_at));
        list
    }

    pub fn create_entry(&self, req: &UpsertEntryRequest) -> Session {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let entry = store.entry_from_request(store.next_entry_id, req);
        store.next_entry_id += 1;
        store.entries.push(entry.clone());
        entry
    }

    pub fn update_entry(&self, entry_id: i64, req: &UpsertEntryRequest) -> Option<Session> {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let updated = store.entry_from_request(entry_id, req);
        let entry = store.entries.iter_mut().find(|e| e.id == entry_id)?;
        *entry = updated.clone();
        Some(updated)
    }

    pub fn delete_entry(&self, entry_id: i64) -> bool {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let before = store.entries.len();
        store.entries.retain(|e| e.id != entry_id);
        store.entries.len() != before
    }

    pub fn category_tree(&self) -> Vec<Category> {
        self.store
            .lock()
            .expect("dev store lock poisoned")
            .categories
            .clone()
    }

    pub fn create_category(&self, req: &NewCategory) -> Category {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let parent_path = req.parent.and_then(|id| store.category_path(id));
        let path = match &parent_path {
            Some(parent) => format!("{}/{}", parent, req.name),
            None => format!("/{}", req.name),
        };
        let category = Category {
            id: store.next_category_id,
            name: req.name.clone(),
            parent: req.parent,
            path,
            icon: req.icon.clone().unwrap_or_default(),
            children: vec![],
        };
        store.next_category_id += 1;
        match req.parent {
            Some(parent_id) => {
                if let Some(parent) = find_by_id_mut(&mut store.categories, parent_id) {
                    parent.children.push(category.clone());
                }
            }
            None => store.categories.push(category.clone()),
        }
        category
    }

    /// Aggregates over finished entries of the category and its
    /// descendants (materialized-path prefix match).
    pub fn category_stats(&self, category_id: i64) -> CategoryStats {
        let store = self.store.lock().expect("dev store lock poisoned");
        let Some(path) = store.category_path(category_id) else {
            return CategoryStats::default();
        };

        let mut finished: Vec<&Session> = store
            .entries
            .iter()
            .filter(|e| e.end_at.is_some() && e.category_name.starts_with(path.as_str()))
            .collect();
        if finished.is_empty() {
            return CategoryStats::default();
        }
        finished.sort_by_key(|e| e.start_at);

        let durations: Vec<i64> = finished.iter().map(|e| e.duration_seconds).collect();
        let total: i64 = durations.iter().sum();
        let recent: Vec<i64> = durations.iter().rev().take(10).copied().collect();

        CategoryStats {
            total_entries: durations.len() as u64,
            avg_duration: total as f64 / durations.len() as f64,
            min_duration: durations.iter().copied().min().unwrap_or(0),
            max_duration: durations.iter().copied().max().unwrap_or(0),
            total_time: total,
            recent_avg: recent.iter().sum::<i64>() as f64 / recent.len() as f64,
        }
    }

    pub fn tasks(&self, category_id: Option<i64>) -> Vec<Task> {
        let store = self.store.lock().expect("dev store lock poisoned");
        store
            .tasks
            .iter()
            .filter(|t| category_id.map_or(true, |id| t.category == id))
            .cloned()
            .collect()
    }

    pub fn create_task(&self, req: &NewTask) -> Task {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let task = Task {
            id: store.next_task_id,
            name: req.name.clone(),
            description: req.description.clone(),
            category: req.category,
            category_name: store.category_path(req.category).unwrap_or_default(),
            default_tags: vec![],
        };
        store.next_task_id += 1;
        store.tasks.push(task.clone());
        task
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.store
            .lock()
            .expect("dev store lock poisoned")
            .tags
            .clone()
    }

    pub fn stats_summary(&self, from: Date, to: Date) -> StatsSummary {
        let finished = self.finished_in_range(from, to);

        let mut by_category: Vec<CategoryBreakdown> = Vec::new();
        let mut by_tag: Vec<TagBreakdown> = Vec::new();
        for entry in &finished {
            match by_category
                .iter_mut()
                .find(|b| b.category_path == entry.category_name)
            {
                Some(bucket) => {
                    bucket.total_seconds += entry.duration_seconds;
                    bucket.entry_count += 1;
                }
                None => by_category.push(CategoryBreakdown {
                    category_path: entry.category_name.clone(),
                    total_seconds: entry.duration_seconds,
                    entry_count: 1,
                }),
            }
            for tag in &entry.tags {
                match by_tag.iter_mut().find(|b| b.tag_name == tag.name) {
                    Some(bucket) => {
                        bucket.total_seconds += entry.duration_seconds;
                        bucket.entry_count += 1;
                    }
                    None => by_tag.push(TagBreakdown {
                        tag_name: tag.name.clone(),
                        total_seconds: entry.duration_seconds,
                        entry_count: 1,
                    }),
                }
            }
        }
        by_category.sort_by_key(|b| std::cmp::Reverse(b.total_seconds));
        by_tag.sort_by_key(|b| std::cmp::Reverse(b.total_seconds));

        let total_seconds: i64 = finished.iter().map(|e| e.duration_seconds).sum();
        let total_entries = finished.len() as u64;
        StatsSummary {
            total_seconds,
            total_entries,
            avg_session_seconds: if total_entries > 0 {
                total_seconds as f64 / total_entries as f64
            } else {
                0.0
            },
            total_seconds_by_category: by_category,
            total_seconds_by_tag: by_tag,
        }
    }

    pub fn top_tasks(&self, from: Date, to: Date, limit: usize) -> Vec<TopTask> {
        let finished = self.finished_in_range(from, to);
        let mut rows: Vec<TopTask> = Vec::new();
        for entry in finished.iter().filter(|e| e.task.is_some()) {
            let name = entry.task_name.clone().unwrap_or_default();
            match rows.iter_mut().find(|r| r.task_name == name) {
                Some(row) => {
                    row.total_seconds += entry.duration_seconds;
                    row.entry_count += 1;
                }
                None => rows.push(TopTask {
                    task_name: name,
                    category_path: entry.category_name.clone(),
                    total_seconds: entry.duration_seconds,
                    entry_count: 1,
                }),
            }
        }
        rows.sort_by_key(|r| std::cmp::Reverse(r.total_seconds));
        rows.truncate(limit);
        rows
    }

    pub fn export_csv(&self, from: Date, to: Date) -> String {
        let mut out = String::from("date,category,task,start,end,duration_min,tags,note\n");
        for entry in self.finished_in_range(from, to) {
            let tags = entry
                .tags
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            out.push_str(&format!(
                "{},{},{},{:02}:{:02},{},{:.1},{},{}\n",
                entry.start_at.date(),
                entry.category_name,
                entry.task_name.clone().unwrap_or_default(),
                entry.start_at.hour(),
                entry.start_at.minute(),
                entry
                    .end_at
                    .map(|end| format!("{:02}:{:02}", end.hour(), end.minute()))
                    .unwrap_or_default(),
                entry.duration_seconds as f64 / 60.0,
                tags,
                entry.note,
            ));
        }
        out
    }

    fn finished_in_range(&self, from: Date, to: Date) -> Vec<Session> {
        let store = self.store.lock().expect("dev store lock poisoned");
        store
            .entries
            .iter()
            .filter(|e| e.end_at.is_some())
            .filter(|e| e.start_at.date() >= from && e.start_at.date() <= to)
            .cloned()
            .collect()
    }
}

impl DevStore {
    fn category_path(&self, id: i64) -> Option<String> {
        domain::find_by_id(&self.categories, id).map(|c| c.path.clone())
    }

    fn entry_from_request(&self, id: i64, req: &UpsertEntryRequest) -> Session {
        Session {
            id,
            category: req.category,
            category_name: self.category_path(req.category).unwrap_or_default(),
            task: req.task,
            task_name: req
                .task
                .and_then(|tid| self.tasks.iter().find(|t| t.id == tid))
                .map(|t| t.name.clone()),
            tags: vec![],
            note: req.note.clone(),
            start_at: req.start_at,
            end_at: req.end_at,
            duration_seconds: req
                .end_at
                .map(|end| (end - req.start_at).whole_seconds())
                .unwrap_or(0),
            is_running: req.end_at.is_none(),
        }
    }
}

fn find_by_id_mut(categories: &mut [Category], id: i64) -> Option<&mut Category> {
    for category in categories {
        if category.id == id {
            return Some(category);
        }
        if let Some(found) = find_by_id_mut(&mut category.children, id) {
            return Some(found);
        }
    }
    None
}

fn seed_store() -> DevStore {
    let categories = vec![
        Category {
            id: 1,
            name: "Work".to_string(),
            parent: None,
            path: "/Work".to_string(),
            icon: String::new(),
            children: vec![
                Category {
                    id: 2,
                    name: "Deep Focus".to_string(),
                    parent: Some(1),
                    path: "/Work/Deep Focus".to_string(),
                    icon: String::new(),
                    children: vec![],
                },
                Category {
                    id: 3,
                    name: "Meetings".to_string(),
                    parent: Some(1),
                    path: "/Work/Meetings".to_string(),
                    icon: String::new(),
                    children: vec![],
                },
            ],
        },
        Category {
            id: 4,
            name: "Personal".to_string(),
            parent: None,
            path: "/Personal".to_string(),
            icon: String::new(),
            children: vec![],
        },
    ];

    let tags = vec![
        Tag {
            id: 1,
            name: "focus".to_string(),
            color: "#C084FC".to_string(),
        },
        Tag {
            id: 2,
            name: "urgent".to_string(),
            color: "#F87171".to_string(),
        },
    ];

    let tasks = vec![
        Task {
            id: 1,
            name: "API refactor".to_string(),
            description: String::new(),
            category: 2,
            category_name: "/Work/Deep Focus".to_string(),
            default_tags: vec![],
        },
        Task {
            id: 2,
            name: "Sprint planning".to_string(),
            description: String::new(),
            category: 3,
            category_name: "/Work/Meetings".to_string(),
            default_tags: vec![],
        },
    ];

    let today = OffsetDateTime::now_utc().date();
    let entry = |id: i64, category: i64, path: &str, h_start: u8, h_end: u8, note: &str| {
        let start = OffsetDateTime::new_utc(
            today,
            time::Time::from_hms(h_start, 0, 0).expect("valid hour"),
        );
        let end =
            OffsetDateTime::new_utc(today, time::Time::from_hms(h_end, 0, 0).expect("valid hour"));
        Session {
            id,
            category,
            category_name: path.to_string(),
            task: None,
            task_name: None,
            tags: vec![],
            note: note.to_string(),
            start_at: start,
            end_at: Some(end),
            duration_seconds: (end - start).whole_seconds(),
            is_running: false,
        }
    };

    let entries = vec![
        entry(1, 2, "/Work/Deep Focus", 8, 10, "API refactor"),
        entry(2, 3, "/Work/Meetings", 10, 11, "standup + planning"),
        entry(3, 2, "/Work/Deep Focus", 13, 15, "review queue"),
        entry(4, 4, "/Personal", 18, 19, "reading"),
    ];

    DevStore {
        categories,
        tasks,
        tags,
        entries,
        next_entry_id: 5,
        next_category_id: 5,
        next_task_id: 3,
    }
}
