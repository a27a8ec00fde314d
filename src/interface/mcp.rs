//! MCP Server for reading-list
//!
//! MCP Protocol (stdio) <-> application::BookCatalog
//!
//! 5 tools: reading_list, book_create, book_update, book_toggle_read, book_delete

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::catalog::BookCatalog;
use crate::application::error::AppError;
use crate::domain::error::DomainError;
use crate::domain::model::book::{Book, UpdateBookRequest};
use crate::domain::model::id::BookId;
use crate::domain::repository::ReadingListRepository;
use crate::infra::json_store::JsonReadingListRepository;

/// 画像ファイルの上限サイズ
const MAX_IMAGE_BYTES: u64 = 16 * 1024 * 1024;

/// 短縮UUIDとして扱う最小の長さ
const MIN_ID_PREFIX_LEN: usize = 4;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。repoが指すJSONファイルから読書リストを開く。
pub async fn run(repo: JsonReadingListRepository) -> anyhow::Result<()> {
    let path = repo.path().to_path_buf();
    let catalog = BookCatalog::open(repo);
    info!(
        path = %path.display(),
        books = catalog.books().len(),
        "reading list opened"
    );

    let server = ReadingListMcpServer::new(catalog);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct ReadingListMcpServer {
    catalog: Arc<Mutex<BookCatalog<JsonReadingListRepository>>>,
    tool_router: ToolRouter<Self>,
}

impl ReadingListMcpServer {
    fn new(catalog: BookCatalog<JsonReadingListRepository>) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            tool_router: Self::tool_router(),
        }
    }

    fn catalog(&self) -> Result<MutexGuard<'_, BookCatalog<JsonReadingListRepository>>, McpError> {
        self.catalog
            .lock()
            .map_err(|_| McpError::internal_error("Lock poisoned", None))
    }

    fn to_mcp_error(e: AppError) -> McpError {
        McpError::invalid_params(format!("{e}"), None)
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for ReadingListMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "reading-list".to_string(),
                title: Some("Reading List".to_string()),
                description: Some(
                    "Personal reading list with read/unread tracking. \
                     Books are numbered in `reading_list` output."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Keep track of books to read and books already read.\n\
                 \n\
                 Tools: `reading_list` → pick a number → `book_toggle_read` / `book_update` / `book_delete`. \
                 `book_create` to add a book."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

/// 表示する一覧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    All,
    Unread,
    Read,
}

fn parse_view(s: Option<&str>) -> Result<View, McpError> {
    match s {
        None | Some("all") => Ok(View::All),
        Some("unread") => Ok(View::Unread),
        Some("read") => Ok(View::Read),
        Some(other) => Err(McpError::invalid_params(
            format!("Unknown view: '{other}'. Use: all, unread, read"),
            None,
        )),
    }
}

/// MCP経由のテキストに含まれるリテラル `\n` を実際の改行に変換する。
fn unescape_newlines(s: &str) -> String {
    s.replace("\\n", "\n")
}

/// 画像ファイルを読み込む。
fn read_image(path: &str) -> Result<Vec<u8>, McpError> {
    let path = Path::new(path);
    let meta = std::fs::metadata(path).map_err(|e| {
        McpError::invalid_params(format!("Cannot read image '{}': {e}", path.display()), None)
    })?;
    if !meta.is_file() {
        return Err(McpError::invalid_params(
            format!("Image path is not a file: '{}'", path.display()),
            None,
        ));
    }
    if meta.len() > MAX_IMAGE_BYTES {
        return Err(McpError::invalid_params(
            format!("Image too large: {} bytes (max {MAX_IMAGE_BYTES})", meta.len()),
            None,
        ));
    }
    std::fs::read(path)
        .map_err(|e| McpError::internal_error(format!("Failed to read image: {e}"), None))
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpReadingListRequest {
    #[schemars(description = "Which books to show: 'all' (default), 'unread', or 'read'")]
    pub view: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookCreateRequest {
    #[schemars(description = "Book title (required)")]
    pub title: String,
    #[schemars(description = "Why you want to read it")]
    #[serde(default)]
    pub reason_to_read: String,
    #[schemars(description = "Optional path to a cover image file")]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookUpdateRequest {
    #[schemars(
        description = "Book number from `reading_list` output (e.g. '2'). UUID, UUID prefix, or title also accepted."
    )]
    pub book: String,
    #[schemars(description = "New title (omit to keep current)")]
    pub title: Option<String>,
    #[schemars(description = "New reason to read (omit to keep current)")]
    pub reason_to_read: Option<String>,
    #[schemars(description = "Path to a new cover image file (omit to keep current)")]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookRefRequest {
    #[schemars(
        description = "Book number from `reading_list` output (e.g. '2'). UUID, UUID prefix, or title also accepted."
    )]
    pub book: String,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl ReadingListMcpServer {
    #[tool(
        name = "reading_list",
        description = "Show the reading list with numbers. Unread books first, then read books, each sorted by title. Use the numbers to specify books in other tools.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn reading_list(
        &self,
        Parameters(req): Parameters<McpReadingListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let view = parse_view(req.view.as_deref())?;
        let catalog = self.catalog()?;

        if catalog.books().is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "Reading list is empty. Use `book_create` to add a book.",
            )]));
        }

        let output = format_reading_list(&catalog, view);
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "book_create",
        description = "Add a book to the reading list as unread. Adding the same title and reason twice keeps a single entry.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn book_create(
        &self,
        Parameters(req): Parameters<McpBookCreateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let title = unescape_newlines(&req.title);
        if title.trim().is_empty() {
            return Err(McpError::invalid_params("title must not be empty", None));
        }
        let image = req.image_path.as_deref().map(read_image).transpose()?;

        let mut catalog = self.catalog()?;
        let before = catalog.books().len();
        let book = catalog.create_book(title, unescape_newlines(&req.reason_to_read), image);
        let verb = if catalog.books().len() > before {
            "Added"
        } else {
            "Already listed"
        };
        let num = number_of(&catalog, book.id()).unwrap_or(0);

        Ok(CallToolResult::success(vec![Content::text(format!(
            "{verb}: {num}. {}",
            book.title()
        ))]))
    }

    #[tool(
        name = "book_update",
        description = "Edit a book's title, reason to read, or cover image. Specify the book by number from `reading_list` output. Only specified fields are changed.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn book_update(
        &self,
        Parameters(req): Parameters<McpBookUpdateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let image = req.image_path.as_deref().map(read_image).transpose()?;

        let mut catalog = self.catalog()?;
        let target = resolve_book(&catalog, &req.book)?;
        let update_req = UpdateBookRequest {
            title: req.title.map(|t| unescape_newlines(&t)),
            reason_to_read: req.reason_to_read.map(|r| unescape_newlines(&r)),
            image,
        };

        let book = catalog
            .update(&target, update_req)
            .ok_or_else(|| Self::to_mcp_error(DomainError::BookNotFound(target.id()).into()))?;
        let num = number_of(&catalog, book.id()).unwrap_or(0);

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Updated: {num}. {}",
            book.title()
        ))]))
    }

    #[tool(
        name = "book_toggle_read",
        description = "Mark a book as read, or back to unread if it was already read. Specify the book by number from `reading_list` output. Numbers change after toggling; re-run `reading_list` before the next call.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn book_toggle_read(
        &self,
        Parameters(req): Parameters<McpBookRefRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut catalog = self.catalog()?;
        let target = resolve_book(&catalog, &req.book)?;

        let book = catalog
            .toggle_read(&target)
            .ok_or_else(|| Self::to_mcp_error(DomainError::BookNotFound(target.id()).into()))?;
        let state = if book.has_been_read() { "read" } else { "unread" };

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Marked as {state}: {}",
            book.title()
        ))]))
    }

    #[tool(
        name = "book_delete",
        description = "Remove a book from the reading list. Specify the book by number from `reading_list` output.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn book_delete(
        &self,
        Parameters(req): Parameters<McpBookRefRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut catalog = self.catalog()?;
        let target = resolve_book(&catalog, &req.book)?;
        catalog.delete(&target);

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Removed: {}",
            target.title()
        ))]))
    }
}

// =============================================================================
// Helpers — 表示番号（未読 → 既読の順に1始まり）
// =============================================================================

/// 表示順（未読 → 既読、それぞれタイトル昇順）の本一覧。
fn display_order<R: ReadingListRepository>(catalog: &BookCatalog<R>) -> Vec<&Book> {
    let mut books = catalog.unread_books();
    books.extend(catalog.read_books());
    books
}

/// 指定した本の表示番号を返す。
fn number_of<R: ReadingListRepository>(catalog: &BookCatalog<R>, id: BookId) -> Option<usize> {
    display_order(catalog)
        .iter()
        .position(|b| b.id() == id)
        .map(|i| i + 1)
}

fn format_line(num: usize, book: &Book) -> String {
    let mark = if book.has_been_read() { "x" } else { " " };
    let mut line = format!("{num}. [{mark}] {}", book.title());
    if !book.reason_to_read().is_empty() {
        line.push_str(&format!(" — {}", book.reason_to_read()));
    }
    if book.image().is_some() {
        line.push_str(" [image]");
    }
    line.push_str(&format!(" ({})\n", book.id().short()));
    line
}

fn format_reading_list<R: ReadingListRepository>(catalog: &BookCatalog<R>, view: View) -> String {
    let unread = catalog.unread_books();
    let read = catalog.read_books();
    let mut output = format!("# Reading List ({} books)\n", catalog.books().len());

    if view != View::Read {
        output.push_str(&format!("\n## Unread ({})\n\n", unread.len()));
        for (i, book) in unread.iter().enumerate() {
            output.push_str(&format_line(i + 1, book));
        }
    }
    if view != View::Unread {
        output.push_str(&format!("\n## Read ({})\n\n", read.len()));
        for (i, book) in read.iter().enumerate() {
            output.push_str(&format_line(unread.len() + i + 1, book));
        }
    }
    output
}

fn looks_like_id_prefix(s: &str) -> bool {
    s.len() >= MIN_ID_PREFIX_LEN && s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// 表示番号 / Full UUID / 短縮UUIDプレフィックス / タイトル部分一致 → Book。
///
/// 優先順位:
/// 1. 表示番号 (e.g. "1", "3") — `reading_list` 出力と対応
/// 2. Full UUID
/// 3. 短縮UUIDプレフィックス（16進数4文字以上）
/// 4. タイトル部分一致（フォールバック）
///
/// 空文字列は拒否する。
fn resolve_book<R: ReadingListRepository>(
    catalog: &BookCatalog<R>,
    s: &str,
) -> Result<Book, McpError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(McpError::invalid_params(
            "Book reference is empty. Pass a number, UUID, or title.",
            None,
        ));
    }
    let ordered = display_order(catalog);

    // 1. 表示番号
    if let Ok(num) = s.parse::<usize>() {
        if num == 0 || num > ordered.len() {
            return Err(McpError::invalid_params(
                format!(
                    "Book number {} out of range (1-{}). Run `reading_list` to see available books.",
                    num,
                    ordered.len()
                ),
                None,
            ));
        }
        return Ok(ordered[num - 1].clone());
    }

    // 2. Full UUID
    if let Ok(id) = s.parse::<BookId>() {
        return catalog
            .require(id)
            .cloned()
            .map_err(ReadingListMcpServer::to_mcp_error);
    }

    // 3. 短縮プレフィックス
    let lowered = s.to_lowercase();
    let id_matches: Vec<&Book> = if looks_like_id_prefix(&lowered) {
        ordered
            .iter()
            .copied()
            .filter(|b| b.id().to_string().starts_with(&lowered))
            .collect()
    } else {
        Vec::new()
    };
    match id_matches.len() {
        1 => return Ok(id_matches[0].clone()),
        n if n > 1 => {
            return Err(McpError::invalid_params(
                format!("Ambiguous ID prefix: '{s}' matches {n} books"),
                None,
            ))
        }
        _ => {}
    }

    // 4. タイトル部分一致（case-insensitive, フォールバック）
    let title_matches: Vec<&Book> = ordered
        .iter()
        .copied()
        .filter(|b| b.title().to_lowercase().contains(&lowered))
        .collect();
    match title_matches.len() {
        0 => Err(McpError::invalid_params(
            format!("No book found matching: '{s}'"),
            None,
        )),
        1 => Ok(title_matches[0].clone()),
        n => Err(McpError::invalid_params(
            format!(
                "Ambiguous title match: '{s}' matches {n} books: {}",
                title_matches
                    .iter()
                    .map(|b| format!(
                        "'{}' ({})",
                        b.title(),
                        number_of(catalog, b.id()).unwrap_or(0)
                    ))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None,
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
