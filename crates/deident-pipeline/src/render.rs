//! 报告文档渲染
//!
//! 将规范化后的报告文本渲染为单字体、多页的PDF字节流，
//! 全程在内存中完成，不落盘。

use deident_core::{DeidentError, Result};
use printpdf::{BuiltinFont, Mm, PdfDocument};

/// 折行列宽（按字符数估算）
const WRAP_COLUMNS: usize = 90;
/// 每页内容行数，对应A4页高减去上下边距
const LINES_PER_PAGE: usize = 42;

/// 将报告文本渲染为PDF字节流
///
/// 任意长度的文本按页切分；空文本产生零内容行的有效文档。
pub fn render_report(text: &str) -> Result<Vec<u8>> {
    let lines = wrap_lines(text, WRAP_COLUMNS);

    let (doc, first_page, first_layer) =
        PdfDocument::new("Report", Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DeidentError::Render(e.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    for (page_index, page_lines) in lines.chunks(LINES_PER_PAGE).enumerate() {
        if page_index > 0 {
            let (page, layer_index) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_index);
        }

        layer.begin_text_section();
        layer.set_font(&font, 11.0);
        layer.set_text_cursor(Mm(20.0), Mm(277.0));
        layer.set_line_height(17.0);
        for line in page_lines {
            layer.write_text(line.as_str(), &font);
            layer.add_line_break();
        }
        layer.end_text_section();
    }

    doc.save_to_bytes()
        .map_err(|e| DeidentError::Render(e.to_string()))
}

/// 按固定列宽对文本折行，保留原有换行与空行
fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for source in text.lines() {
        if source.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in source.split_whitespace() {
            let width = current.chars().count();
            let needed = word.chars().count() + if current.is_empty() { 0 } else { 1 };
            if !current.is_empty() && width + needed > columns {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);

            // 单词本身超过列宽时硬切
            while current.chars().count() > columns {
                let head: String = current.chars().take(columns).collect();
                let rest: String = current.chars().skip(columns).collect();
                lines.push(head);
                current = rest;
            }
        }
        lines.push(current);
    }
    lines
}
