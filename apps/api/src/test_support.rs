//! Fixtures shared by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{BackendError, CharacterBackend};
use crate::models::{Character, NewCharacter, NewUser, RecordId, Skill, Spell, User};

pub fn thrain() -> Character {
    Character {
        id: Some(RecordId::from("7")),
        id_user: Some(RecordId::from("u1")),
        name: Some("Thrain".to_string()),
        race: Some("dwarf".to_string()),
        class_name: Some("fighter".to_string()),
        level: Some(3),
        strength: Some(16),
        dexterity: Some(12),
        constitution: Some(15),
        intelligence: Some(10),
        wisdom: Some(11),
        charisma: Some(8),
        hit_points: Some(28),
        armor_class: Some(18),
        initiative: Some(1),
        speed: Some(25),
        background: Some("Exiled from the Lonely Mountain.".to_string()),
    }
}

pub fn skill(name: &str, description: &str) -> Skill {
    Skill {
        id: None,
        id_character: RecordId::from("7"),
        name: name.to_string(),
        description: description.to_string(),
        level: Some(1),
    }
}

pub fn spell(name: &str, level: Option<i64>) -> Spell {
    Spell {
        id: None,
        id_character: RecordId::from("7"),
        name: name.to_string(),
        description: "A flash of light.".to_string(),
        level_spell: level,
    }
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    characters: Vec<Character>,
    skills: Vec<Skill>,
    spells: Vec<Spell>,
}

/// In-memory [`CharacterBackend`] with write counting and failure injection.
#[derive(Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
    next_id: AtomicU64,
    writes: AtomicUsize,
    failing: Mutex<HashMap<&'static str, u16>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        }
    }

    pub fn with_user(self, id: &str, name: &str, email: &str) -> Self {
        self.store.lock().unwrap().users.push(User {
            id: RecordId::from(id),
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn with_character(self, character: Character) -> Self {
        self.store.lock().unwrap().characters.push(character);
        self
    }

    pub fn with_skill(self, skill: Skill) -> Self {
        self.store.lock().unwrap().skills.push(skill);
        self
    }

    pub fn remove_user(&self, id: &str) {
        self.store.lock().unwrap().users.retain(|u| u.id.as_str() != id);
    }

    /// Makes every call of `operation` fail with `status`.
    pub fn fail(&self, operation: &'static str, status: u16) {
        self.failing.lock().unwrap().insert(operation, status);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &'static str) -> Result<(), BackendError> {
        match self.failing.lock().unwrap().get(operation) {
            Some(&status) => Err(BackendError::Status {
                status,
                message: format!("{operation} failed"),
            }),
            None => Ok(()),
        }
    }

    fn fresh_id(&self) -> RecordId {
        RecordId(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CharacterBackend for InMemoryBackend {
    async fn list_characters(&self, user_id: &RecordId) -> Result<Vec<Character>, BackendError> {
        self.check("list_characters")?;
        let store = self.store.lock().unwrap();
        Ok(store
            .characters
            .iter()
            .filter(|c| c.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn get_character(&self, id: &RecordId) -> Result<Option<Character>, BackendError> {
        self.check("get_character")?;
        let store = self.store.lock().unwrap();
        Ok(store
            .characters
            .iter()
            .find(|c| c.id.as_ref() == Some(id))
            .cloned())
    }

    async fn create_character(&self, new: &NewCharacter) -> Result<Character, BackendError> {
        self.check("create_character")?;
        self.write();
        let character = Character {
            id: Some(self.fresh_id()),
            id_user: new.id_user.clone(),
            name: Some(new.name.clone()),
            race: Some(new.race.clone()),
            class_name: Some(new.class_name.clone()),
            level: Some(new.level),
            strength: Some(new.strength),
            dexterity: Some(new.dexterity),
            constitution: Some(new.constitution),
            intelligence: Some(new.intelligence),
            wisdom: Some(new.wisdom),
            charisma: Some(new.charisma),
            hit_points: Some(new.hit_points),
            armor_class: Some(new.armor_class),
            initiative: Some(new.initiative),
            speed: Some(new.speed),
            background: Some(new.background.clone()),
        };
        self.store.lock().unwrap().characters.push(character.clone());
        Ok(character)
    }

    async fn delete_character(&self, id: &RecordId) -> Result<(), BackendError> {
        self.check("delete_character")?;
        self.write();
        let mut store = self.store.lock().unwrap();
        store.characters.retain(|c| c.id.as_ref() != Some(id));
        store.skills.retain(|s| &s.id_character != id);
        store.spells.retain(|s| &s.id_character != id);
        Ok(())
    }

    async fn list_skills(&self, character_id: &RecordId) -> Result<Vec<Skill>, BackendError> {
        self.check("list_skills")?;
        let store = self.store.lock().unwrap();
        Ok(store
            .skills
            .iter()
            .filter(|s| &s.id_character == character_id)
            .cloned()
            .collect())
    }

    async fn create_skill(&self, skill: &Skill) -> Result<Skill, BackendError> {
        self.check("create_skill")?;
        self.write();
        let mut created = skill.clone();
        created.id = Some(self.fresh_id());
        self.store.lock().unwrap().skills.push(created.clone());
        Ok(created)
    }

    async fn list_spells(&self, character_id: &RecordId) -> Result<Vec<Spell>, BackendError> {
        self.check("list_spells")?;
        let store = self.store.lock().unwrap();
        Ok(store
            .spells
            .iter()
            .filter(|s| &s.id_character == character_id)
            .cloned()
            .collect())
    }

    async fn create_spell(&self, spell: &Spell) -> Result<Spell, BackendError> {
        self.check("create_spell")?;
        self.write();
        let mut created = spell.clone();
        created.id = Some(self.fresh_id());
        self.store.lock().unwrap().spells.push(created.clone());
        Ok(created)
    }

    async fn register_user(&self, user: &NewUser) -> Result<User, BackendError> {
        self.check("register_user")?;
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store.users.iter().find(|u| u.email == user.email) {
            return Ok(existing.clone());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let created = User {
            id: self.fresh_id(),
            name: user.name.clone(),
            email: user.email.clone(),
        };
        store.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BackendError> {
        self.check("find_user_by_email")?;
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }
}
