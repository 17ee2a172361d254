use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {anyhow::Result, async_trait::async_trait, tracing::warn};

use crate::{Session, session::now_ms, store::SessionBackend};

type SessionMap = BTreeMap<String, Session>;

/// All sessions in one JSON object keyed by id.
///
/// Each write re-reads the whole file under an exclusive advisory lock on a
/// sibling `.lock` file, applies the change and swaps the result in with a
/// rename, so several processes can share one file.
pub struct JsonFileBackend {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_map<R, F>(&self, write_back: bool, f: F) -> Result<R>
    where
        F: FnOnce(&mut SessionMap) -> R + Send + 'static,
        R: Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        tokio::task::spawn_blocking(move || locked_read_modify_write(&path, &lock_path, write_back, f))
            .await?
    }
}

fn open_lock_file(lock_path: &Path) -> Result<File> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?)
}

/// Read the session map. A missing file is an empty map; an unreadable one is
/// an error; one that does not parse is moved aside as
/// `<name>.corrupt-<millis>` so the next write cannot clobber it.
fn read_map(path: &Path) -> Result<SessionMap> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SessionMap::new()),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_slice(&data) {
        Ok(map) => Ok(map),
        Err(e) => {
            let aside = quarantine(path)?;
            warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "session file is corrupt, moved it aside"
            );
            Ok(SessionMap::new())
        },
    }
}

fn quarantine(path: &Path) -> Result<PathBuf> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", now_ms()));
    let aside = path.with_file_name(name);
    fs::rename(path, &aside)?;
    Ok(aside)
}

fn write_map(path: &Path, map: &SessionMap) -> Result<()> {
    let data = serde_json::to_string_pretty(map)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn locked_read_modify_write<R>(
    path: &Path,
    lock_path: &Path,
    write_back: bool,
    f: impl FnOnce(&mut SessionMap) -> R,
) -> Result<R> {
    let mut lock = fd_lock::RwLock::new(open_lock_file(lock_path)?);
    let _guard = lock.write()?;

    let mut map = read_map(path)?;
    let out = f(&mut map);
    if write_back {
        write_map(path, &map)?;
    }
    Ok(out)
}

#[async_trait]
impl SessionBackend for JsonFileBackend {
    async fn load_all(&self) -> Result<Vec<Session>> {
        self.with_map(false, |map| map.values().cloned().collect())
            .await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let session = session.clone();
        self.with_map(true, move |map| {
            map.insert(session.id.clone(), session);
        })
        .await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_map(true, move |map| {
            map.remove(&id);
        })
        .await
    }
}
