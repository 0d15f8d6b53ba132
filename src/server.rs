//! 命令分发
//!
//! `Server` 持有存储、命令表和可选的密码，所有连接共享同一个实例。
//! `Session` 是每个连接自己的状态，目前只有是否已经通过认证。

use crate::command::CommandTable;
use crate::error::CommandError;
use crate::reply::Reply;
use crate::store::Storage;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

#[derive(Debug)]
pub struct Server {
    storage: Storage,
    commands: CommandTable,
    password: Option<String>,
}

impl Server {
    pub fn new(storage: Storage, commands: CommandTable, password: Option<String>) -> Self {
        Self {
            storage,
            commands,
            password,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn requires_auth(&self) -> bool {
        self.password.is_some()
    }

    /// 查找并执行命令，`name` 必须已经是小写
    pub fn process(&self, name: &str, args: &[String]) -> Reply {
        match self.commands.get(name) {
            Some(command) => command(&self.storage, args).into(),
            None => Reply::Error(CommandError::UnknownCommand),
        }
    }

    /// 常数时间比较密码；没有配置密码时任何输入都通过
    fn check_password(&self, candidate: &str) -> bool {
        match &self.password {
            Some(password) => bool::from(candidate.as_bytes().ct_eq(password.as_bytes())),
            None => true,
        }
    }
}

/// 单个连接的会话
#[derive(Debug)]
pub struct Session {
    server: Arc<Server>,
    authorized: bool,
}

impl Session {
    pub fn new(server: Arc<Server>) -> Self {
        let authorized = !server.requires_auth();
        Self { server, authorized }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// 执行一条命令
    ///
    /// `quit` 和 `auth` 在会话层处理，其余命令在认证之后交给 `Server`
    pub fn process(&mut self, name: &str, args: &[String]) -> Reply {
        match name {
            "quit" => Reply::Quit,
            "auth" => self.auth(args),
            _ if !self.authorized => Reply::Error(CommandError::NotAuthorized),
            _ => self.server.process(name, args),
        }
    }

    /// 执行一行以空白分隔的命令文本，命令名不区分大小写
    pub fn process_line(&mut self, line: &str) -> Reply {
        let mut parts = line.split_whitespace().map(str::to_string);
        let Some(name) = parts.next() else {
            return Reply::Error(CommandError::EmptyCommand);
        };
        let args: Vec<String> = parts.collect();
        self.process(&name.to_lowercase(), &args)
    }

    fn auth(&mut self, args: &[String]) -> Reply {
        if args.len() != 1 {
            return Reply::Error(CommandError::WrongNumberOfArguments);
        }

        if self.server.check_password(&args[0]) {
            self.authorized = true;
            Reply::OK
        } else {
            debug!("认证失败");
            Reply::Error(CommandError::WrongPassword)
        }
    }
}
