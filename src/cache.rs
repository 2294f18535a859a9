//! This module provides a checklist backend that stores its notes in a local file

use std::path::PathBuf;
use std::path::Path;
use std::error::Error;
use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use csscolorparser::Color;

use crate::traits::ChecklistBackend;
use crate::course::{Course, CourseId};
use crate::item::ChecklistItem;
use crate::reconcile::{CoursePlan, Update, UpdatePlan};
use crate::task::Task;
use crate::time;


/// A checklist note, that gathers the items of a course
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    title: String,
    color: Color,
    pinned: bool,
    items: Vec<ChecklistItem>,
}

impl Note {
    pub fn new(title: String, color: Color, pinned: bool) -> Self {
        Self { title, color, pinned, items: Vec::new() }
    }

    pub fn title(&self) -> &str { &self.title }
    pub fn color(&self) -> &Color { &self.color }
    pub fn pinned(&self) -> bool { self.pinned }
    pub fn items(&self) -> &[ChecklistItem] { &self.items }

    /// Append an item at the end of this note
    pub fn add_item(&mut self, item: ChecklistItem) {
        self.items.push(item);
    }

    /// Returns the first item that has this exact text
    pub fn get_item_mut(&mut self, text: &str) -> Option<&mut ChecklistItem> {
        self.items.iter_mut().find(|item| item.text == text)
    }

    /// Sort items by due date. Items that cannot be parsed go last, and keep their relative order
    pub fn sort_items(&mut self) {
        self.items.sort_by_cached_key(|item| {
            match Task::from_checklist_item(item) {
                Ok(task) => task.sort_key(),
                Err(_) => time::max_sentinel(),
            }
        });
    }
}


/// A checklist backend that stores its notes in a local JSON file
#[derive(Debug, PartialEq)]
pub struct ChecklistCache {
    backing_file: PathBuf,
    pin_notes: bool,
    data: CachedData,
}

#[derive(Default, Debug, PartialEq, Serialize, Deserialize)]
struct CachedData {
    notes: BTreeMap<CourseId, Note>,
}

impl ChecklistCache {
    /// Initialize a cache from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let data = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(std::io::BufReader::new(file))?,
        };

        Ok(Self{
            backing_file: PathBuf::from(path),
            pin_notes: false,
            data,
        })
    }

    /// Initialize a cache from its backing file, or with the default contents in case this file does not exist yet.
    ///
    /// Any other error is returned: the checklists of an unreadable file must not be overwritten
    pub fn from_file_or_new(path: &Path) -> Result<Self, Box<dyn Error>> {
        match std::fs::metadata(path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No cache file at {:?} yet. Starting with empty checklists", path);
                Ok(Self::new(path))
            },
            _ => Self::from_file(path),
        }
    }

    /// Initialize a cache with the default contents
    pub fn new(path: &Path) -> Self {
        Self{
            backing_file: PathBuf::from(path),
            pin_notes: false,
            data: CachedData::default(),
        }
    }

    /// Whether notes should be pinned when they are updated
    pub fn with_pinned_notes(mut self, pin_notes: bool) -> Self {
        self.pin_notes = pin_notes;
        self
    }

    pub fn backing_file(&self) -> &Path {
        &self.backing_file
    }

    /// Store the current content to the backing file
    pub fn save_to_file(&self) -> Result<(), Box<dyn Error>> {
        let path = &self.backing_file;
        if let Some(parent) = path.parent() {
            if parent.as_os_str().is_empty() == false {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = match std::fs::File::create(path) {
            Err(err) => {
                return Err(format!("Unable to save file {:?}: {}", path, err).into());
            },
            Ok(f) => f,
        };

        serde_json::to_writer_pretty(file, &self.data)?;
        Ok(())
    }

    pub fn note(&self, course: CourseId) -> Option<&Note> {
        self.data.notes.get(&course)
    }

    /// Returns a mutable reference to a note. This is how users' edits can be simulated
    pub fn note_mut(&mut self, course: CourseId) -> Option<&mut Note> {
        self.data.notes.get_mut(&course)
    }

    fn get_or_insert_note(&mut self, course: &Course) -> &mut Note {
        let pin_notes = self.pin_notes;
        let note = self.data.notes.entry(course.id).or_insert_with(|| {
            log::debug!("Creating a note for course {} ({})", course.nickname, course.id);
            Note::new(course.nickname.clone(), course.color.clone(), pin_notes)
        });
        note.pinned = pin_notes;
        note
    }

    /// Apply the plan of a course to its note. Returns how many updates could not be applied
    fn apply_course_plan(note: &mut Note, plan: &CoursePlan) -> usize {
        let mut n_failures = 0;
        for update in plan.updates() {
            match update {
                Update::Add(task) => {
                    note.add_item(ChecklistItem::new(task.checklist_text(), task.checked()));
                },
                Update::MarkComplete(task) => {
                    let text = task.checklist_text();
                    match note.get_item_mut(&text) {
                        Some(item) => item.checked = true,
                        None => {
                            log::warn!("Unable to mark {:?} as complete: there is no such item in note {:?}", text, note.title);
                            n_failures += 1;
                        },
                    }
                },
            }
        }
        n_failures
    }
}

#[async_trait]
impl ChecklistBackend for ChecklistCache {
    async fn read_state(&mut self, courses: &[Course]) -> Result<HashMap<CourseId, Vec<ChecklistItem>>, Box<dyn Error>> {
        Ok(courses.iter()
            .map(|course| {
                let items = self.data.notes.get(&course.id)
                    .map(|note| note.items.clone())
                    .unwrap_or_default();
                (course.id, items)
            })
            .collect()
        )
    }

    async fn apply_plan(&mut self, plan: &UpdatePlan, courses: &[Course]) -> Result<(), Box<dyn Error>> {
        let mut n_failures = 0;
        for course in courses {
            let note = self.get_or_insert_note(course);
            if let Some(course_plan) = plan.course(course.id) {
                n_failures += Self::apply_course_plan(note, course_plan);
            }
            note.sort_items();
        }

        for (course_id, _) in plan.iter().filter(|(_, course_plan)| course_plan.is_empty() == false) {
            if courses.iter().any(|course| course.id == *course_id) == false {
                log::warn!("The plan has updates for course {}, that is not monitored. Ignoring them", course_id);
                n_failures += 1;
            }
        }

        self.save_to_file()?;

        match n_failures {
            0 => Ok(()),
            n => Err(format!("{} update(s) could not be applied", n).into()),
        }
    }
}
