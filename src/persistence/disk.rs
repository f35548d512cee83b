use crate::consensus::{Datum, Term};
use crate::persistence::api::{DatumPersistence, PersistenceError};
use crate::persistence::key_codec;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const DATUMS_DIR: &str = "datums";
const META_FILE: &str = "meta.json";

#[derive(Serialize, Deserialize)]
struct PersistedMeta {
    term: Term,
}

/// Layout under the data directory:
///
/// ```text
/// <data_dir>/meta.json          {"term": N}
/// <data_dir>/datums/<escaped>   one JSON-encoded datum per key
/// ```
///
/// Every record is written to a dot-prefixed temp file, synced, then renamed into place.
pub(crate) struct FileDatumPersistence {
    logger: slog::Logger,
    datums_dir: PathBuf,
    meta_path: PathBuf,
}

impl FileDatumPersistence {
    pub(crate) fn open(logger: slog::Logger, data_dir: &Path) -> Result<Self, PersistenceError> {
        let datums_dir = data_dir.join(DATUMS_DIR);
        fs::create_dir_all(&datums_dir).map_err(|e| PersistenceError::io(&datums_dir, e))?;

        Ok(FileDatumPersistence {
            logger,
            datums_dir,
            meta_path: data_dir.join(META_FILE),
        })
    }

    fn datum_path(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        Ok(self.datums_dir.join(key_codec::key_to_file_name(key)?))
    }
}

impl DatumPersistence for FileDatumPersistence {
    fn load_datums(&self) -> Result<Vec<Datum>, PersistenceError> {
        let entries = fs::read_dir(&self.datums_dir).map_err(|e| PersistenceError::io(&self.datums_dir, e))?;

        let mut datums = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PersistenceError::io(&self.datums_dir, e))?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if key_codec::is_temp_file_name(&file_name) {
                slog::debug!(self.logger, "Skipping leftover temp file {:?}", path);
                continue;
            }

            let key = key_codec::file_name_to_key(&file_name)?;
            let datum: Datum = read_json(&path)?;
            if datum.key != key {
                slog::warn!(
                    self.logger,
                    "Record {:?} holds key {:?}, which doesn't match its file name",
                    path,
                    datum.key
                );
            }
            datums.push(datum);
        }

        Ok(datums)
    }

    fn write(&mut self, datum: &Datum) -> Result<(), PersistenceError> {
        let path = self.datum_path(&datum.key)?;
        write_json_atomically(&path, datum)
    }

    fn delete(&mut self, key: &str) -> Result<(), PersistenceError> {
        let path = self.datum_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    fn load_term(&self) -> Result<Option<Term>, PersistenceError> {
        if !self.meta_path.exists() {
            return Ok(None);
        }
        let meta: PersistedMeta = read_json(&self.meta_path)?;

        Ok(Some(meta.term))
    }

    fn update_term(&mut self, term: Term) -> Result<(), PersistenceError> {
        write_json_atomically(&self.meta_path, &PersistedMeta { term })
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PersistenceError> {
    let file = File::open(path).map_err(|e| PersistenceError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistenceError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let temp_path = temp_path_for(path);

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| PersistenceError::io(&temp_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| PersistenceError::Corrupt {
        path: temp_path.clone(),
        source,
    })?;
    writer.flush().map_err(|e| PersistenceError::io(&temp_path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| PersistenceError::io(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| PersistenceError::io(path, e))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn datum(key: &str, value: &str, timestamp: u64) -> Datum {
        Datum {
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }

    fn sorted(mut datums: Vec<Datum>) -> Vec<Datum> {
        datums.sort_by(|l, r| l.key.cmp(&r.key));
        datums
    }

    #[test]
    fn datums_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut persistence = FileDatumPersistence::open(logger(), dir.path()).unwrap();
            persistence.write(&datum("svc:x", "v1", 1)).unwrap();
            persistence.write(&datum("svc:x", "v2", 2)).unwrap();
            persistence.write(&datum("../escape", "v", 9)).unwrap();
            persistence.write(&datum(".hidden", "h", 3)).unwrap();
        }

        let persistence = FileDatumPersistence::open(logger(), dir.path()).unwrap();

        assert_eq!(
            sorted(persistence.load_datums().unwrap()),
            vec![
                datum("../escape", "v", 9),
                datum(".hidden", "h", 3),
                datum("svc:x", "v2", 2),
            ]
        );
        // Nothing escaped the datums directory.
        let mut top_level: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        top_level.sort();
        assert_eq!(top_level, vec![DATUMS_DIR.to_string()]);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut persistence = FileDatumPersistence::open(logger(), dir.path()).unwrap();
        persistence.write(&datum("k", "v", 1)).unwrap();

        persistence.delete("k").unwrap();
        persistence.delete("k").unwrap();

        assert!(persistence.load_datums().unwrap().is_empty());
    }

    #[test]
    fn term_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut persistence = FileDatumPersistence::open(logger(), dir.path()).unwrap();
        assert_eq!(persistence.load_term().unwrap(), None);

        persistence.update_term(Term::new(7)).unwrap();
        persistence.update_term(Term::new(107)).unwrap();

        let persistence = FileDatumPersistence::open(logger(), dir.path()).unwrap();
        assert_eq!(persistence.load_term().unwrap(), Some(Term::new(107)));
    }

    #[test]
    fn temp_files_are_skipped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut persistence = FileDatumPersistence::open(logger(), dir.path()).unwrap();
        persistence.write(&datum("k", "v", 1)).unwrap();
        fs::write(dir.path().join(DATUMS_DIR).join(".k.tmp"), b"{ half written").unwrap();

        assert_eq!(persistence.load_datums().unwrap(), vec![datum("k", "v", 1)]);
    }

    #[test]
    fn corrupt_record_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FileDatumPersistence::open(logger(), dir.path()).unwrap();
        fs::write(dir.path().join(DATUMS_DIR).join("k"), b"not json").unwrap();

        assert!(matches!(
            persistence.load_datums(),
            Err(PersistenceError::Corrupt { .. })
        ));
    }
}
