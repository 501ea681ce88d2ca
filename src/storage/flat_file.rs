//! Flat-file 谓词后端
//!
//! 每个 (botid, userid) 一个文件：`<dir>/<botid>/<userid>.predicates`，
//! 内容为 `name=value` 行。多值谓词按 `name`、`name.2`、`name.3`…
//! 摊平存放。值中的换行与等号在写入时转义。

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage::store::PredicateStore;

/// 谓词文件后缀
const PREDICATES_SUFFIX: &str = ".predicates";

/// Flat-file 实现
pub struct FlatFilePredicateStore {
    dir: PathBuf,
    /// 同一文件的读-改-写串行化
    write_lock: Mutex<()>,
}

impl FlatFilePredicateStore {
    /// 以给定目录创建后端
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn file_for(&self, userid: &str, botid: &str) -> PathBuf {
        self.dir
            .join(sanitize(botid))
            .join(format!("{}{}", sanitize(userid), PREDICATES_SUFFIX))
    }

    fn read_map(&self, userid: &str, botid: &str) -> Result<BTreeMap<String, String>> {
        let path = self.file_for(userid, botid);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&path)?;
        let mut map = BTreeMap::new();
        for line in content.lines() {
            if let Some((name, value)) = line.split_once('=') {
                map.insert(name.to_string(), unescape(value));
            }
        }
        Ok(map)
    }

    fn write_map(&self, userid: &str, botid: &str, map: &BTreeMap<String, String>) -> Result<()> {
        let path = self.file_for(userid, botid);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = String::new();
        for (name, value) in map {
            content.push_str(name);
            content.push('=');
            content.push_str(&escape(value));
            content.push('\n');
        }
        fs::write(&path, content)?;
        Ok(())
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl PredicateStore for FlatFilePredicateStore {
    fn load(&self, name: &str, userid: &str, botid: &str) -> Result<Option<String>> {
        Ok(self.read_map(userid, botid)?.remove(name))
    }

    fn save(&self, name: &str, value: &str, userid: &str, botid: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map(userid, botid)?;
        map.insert(name.to_string(), value.to_string());
        self.write_map(userid, botid, &map)
    }

    fn check_user(&self, _userid: &str, _password: &str, _botid: &str) -> Result<bool> {
        // flat-file 后端不支持认证，全部放行
        Ok(true)
    }

    fn create_user(&self, _userid: &str, _password: &str, _botid: &str) -> Result<()> {
        Ok(())
    }

    fn change_password(&self, _userid: &str, _password: &str, _botid: &str) -> Result<()> {
        Ok(())
    }

    fn user_count(&self, botid: &str) -> Result<usize> {
        let dir = self.dir.join(sanitize(botid));
        if !dir.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry
                .file_name()
                .to_string_lossy()
                .ends_with(PREDICATES_SUFFIX)
            {
                count += 1;
            }
        }
        Ok(count)
    }
}
