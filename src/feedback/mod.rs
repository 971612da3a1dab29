//! 留言板
//!
//! 两个只追加的文本文件：留言与回复。留言编号在写入时分配并写入行内，
//! 取留言与回复中出现过的最大编号 + 1。回复按编号关联，删除历史行不会打乱对应关系。

mod record;

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::core::config::FeedbackConfig;
use crate::core::error::{Result, SpiderError};

pub use self::record::{FeedbackMessage, FeedbackReply, sanitize_name};

/// 一条留言及其全部回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub message: FeedbackMessage,
    pub replies: Vec<String>,
}

/// 分页结果
#[derive(Debug, Clone)]
pub struct BoardPage {
    /// 实际展示的页码 (已钳制到有效范围)
    pub page: usize,
    pub total_pages: usize,
    pub total_messages: usize,
    pub threads: Vec<Thread>,
}

pub struct FeedbackBoard {
    messages_path: PathBuf,
    replies_path: PathBuf,
    page_size: usize,
    lock: Mutex<()>,
}

impl FeedbackBoard {
    /// 打开留言板，文件不存在时创建
    pub fn open(config: &FeedbackConfig) -> Result<Self> {
        let board = Self {
            messages_path: PathBuf::from(&config.messages_path),
            replies_path: PathBuf::from(&config.replies_path),
            page_size: config.page_size.max(1),
            lock: Mutex::new(()),
        };
        touch(&board.messages_path)?;
        touch(&board.replies_path)?;
        Ok(board)
    }

    /// 发表留言
    pub fn post(&self, name: &str, text: &str) -> Result<FeedbackMessage> {
        let body = text.trim();
        if body.is_empty() {
            return Err(SpiderError::EmptyFeedback("留言"));
        }

        let _guard = self.lock.lock();
        let next_id = self.next_id()?;

        let message = FeedbackMessage {
            id: next_id,
            author: sanitize_name(name),
            body: body.to_string(),
        };
        append_line(&self.messages_path, &message.to_line())?;
        info!("已保存留言 #{} ({})", message.id, message.author);
        Ok(message)
    }

    /// 回复留言
    pub fn reply(&self, message_id: u64, text: &str) -> Result<FeedbackReply> {
        let body = text.trim();
        if body.is_empty() {
            return Err(SpiderError::EmptyFeedback("回复"));
        }

        let _guard = self.lock.lock();
        if !self.read_messages()?.iter().any(|m| m.id == message_id) {
            return Err(SpiderError::UnknownMessage(message_id));
        }

        let reply = FeedbackReply {
            message_id,
            body: body.to_string(),
        };
        append_line(&self.replies_path, &reply.to_line())?;
        info!("已回复留言 #{}", message_id);
        Ok(reply)
    }

    /// 读取指定页 (从 1 开始)，超出范围的页码钳制到首页或末页
    pub fn page(&self, page: usize) -> Result<BoardPage> {
        let (messages, replies) = {
            let _guard = self.lock.lock();
            (self.read_messages()?, self.read_replies()?)
        };

        let total_messages = messages.len();
        let total_pages = total_messages.div_ceil(self.page_size).max(1);
        let page = page.clamp(1, total_pages);

        let threads = messages
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .map(|message| Thread {
                replies: replies
                    .iter()
                    .filter(|r| r.message_id == message.id)
                    .map(|r| r.body.clone())
                    .collect(),
                message,
            })
            .collect();

        Ok(BoardPage {
            page,
            total_pages,
            total_messages,
            threads,
        })
    }

    /// 回复中引用过的编号同样视为已占用，删掉最新留言后编号也不会复用
    fn next_id(&self) -> Result<u64> {
        let messages = self.read_messages()?;
        let replies = self.read_replies()?;
        let max = messages
            .iter()
            .map(|m| m.id)
            .chain(replies.iter().map(|r| r.message_id))
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    fn read_messages(&self) -> Result<Vec<FeedbackMessage>> {
        read_records(&self.messages_path, FeedbackMessage::parse_line)
    }

    fn read_replies(&self) -> Result<Vec<FeedbackReply>> {
        read_records(&self.replies_path, FeedbackReply::parse_line)
    }
}

fn touch(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

fn read_records<T>(path: &Path, parse: impl Fn(&str) -> Option<T>) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse(&line) {
            Some(record) => records.push(record),
            None => warn!("{}:{} 格式无法识别，已忽略", path.display(), idx + 1),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_in(dir: &Path) -> FeedbackBoard {
        let config = FeedbackConfig {
            messages_path: dir.join("board/messages.txt").display().to_string(),
            replies_path: dir.join("board/replies.txt").display().to_string(),
            page_size: 5,
        };
        FeedbackBoard::open(&config).unwrap()
    }

    #[test]
    fn open_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let board = board_in(dir.path());
        assert!(board.messages_path.exists());
        assert!(board.replies_path.exists());

        let page = board.page(1).unwrap();
        assert_eq!(page.total_pages, 1);
        assert!(page.threads.is_empty());
    }

    #[test]
    fn post_and_reply_round_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let board = board_in(dir.path());

        let first = board.post("Alice", "更新好慢\n求加更").unwrap();
        let second = board.post("", "好看").unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(second.author, "匿名用户");

        board.reply(1, "在写了").unwrap();
        board.reply(1, "明天更").unwrap();

        let page = board.page(1).unwrap();
        assert_eq!(page.threads.len(), 2);
        assert_eq!(page.threads[0].message.body, "更新好慢\n求加更");
        assert_eq!(page.threads[0].replies, vec!["在写了", "明天更"]);
        assert!(page.threads[1].replies.is_empty());
    }

    #[test]
    fn empty_text_and_unknown_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let board = board_in(dir.path());

        assert!(matches!(board.post("Bob", "   "), Err(SpiderError::EmptyFeedback(_))));
        assert!(matches!(board.reply(9, "hi"), Err(SpiderError::UnknownMessage(9))));

        board.post("Bob", "hello").unwrap();
        assert!(matches!(board.reply(1, ""), Err(SpiderError::EmptyFeedback(_))));
    }

    #[test]
    fn ids_stay_stable_after_a_line_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let board = board_in(dir.path());
        for i in 1..=3 {
            board.post("u", &format!("msg {i}")).unwrap();
        }
        board.reply(3, "reply to third").unwrap();

        let content = fs::read_to_string(&board.messages_path).unwrap();
        let kept: Vec<&str> = content.lines().filter(|l| !l.starts_with("#1 ")).collect();
        fs::write(&board.messages_path, kept.join("\n") + "\n").unwrap();

        let page = board.page(1).unwrap();
        assert_eq!(page.threads.len(), 2);
        assert_eq!(page.threads[1].message.id, 3);
        assert_eq!(page.threads[1].replies, vec!["reply to third"]);
        assert!(page.threads[0].replies.is_empty());

        assert_eq!(board.post("u", "msg 4").unwrap().id, 4);
    }

    #[test]
    fn removed_newest_message_does_not_hand_its_replies_to_a_new_post() {
        let dir = tempfile::tempdir().unwrap();
        let board = board_in(dir.path());
        board.post("u", "first").unwrap();
        board.post("u", "second").unwrap();
        board.reply(2, "reply to second").unwrap();

        let content = fs::read_to_string(&board.messages_path).unwrap();
        let kept: Vec<&str> = content.lines().filter(|l| !l.starts_with("#2 ")).collect();
        fs::write(&board.messages_path, kept.join("\n") + "\n").unwrap();

        let fresh = board.post("u", "third").unwrap();
        assert_eq!(fresh.id, 3);

        let page = board.page(1).unwrap();
        assert_eq!(page.threads.len(), 2);
        assert_eq!(page.threads[1].message.body, "third");
        assert!(page.threads[1].replies.is_empty());
    }

    #[test]
    fn pages_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let board = board_in(dir.path());
        for i in 1..=12 {
            board.post("u", &format!("msg {i}")).unwrap();
        }

        let page = board.page(2).unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.threads.first().unwrap().message.id, 6);

        let last = board.page(99).unwrap();
        assert_eq!(last.page, 3);
        assert_eq!(last.threads.len(), 2);

        assert_eq!(board.page(0).unwrap().page, 1);
    }

    #[test]
    fn garbage_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let board = board_in(dir.path());
        board.post("u", "ok").unwrap();
        append_line(&board.messages_path, "旧格式: 没有编号").unwrap();

        assert_eq!(board.page(1).unwrap().total_messages, 1);
        assert_eq!(board.post("u", "next").unwrap().id, 2);
    }
}
