//! 门户页面布局
//!
//! 集中描述搜索页上各个元素的定位方式，流程代码只引用这里的定位器

use crate::infrastructure::Locator;

/// 门户搜索页的元素定位
#[derive(Debug, Clone)]
pub struct PortalLayout {
    /// "Número de expediente" 输入框
    pub search_field: Locator,
    /// "Aplicar filtros" 按钮
    pub apply_filters: Locator,
    /// 搜索结果按钮所用的 CSS（按文本中包含编码来匹配）
    pub result_button_css: String,
    /// "无结果" 提示
    pub no_results: Locator,
    /// 详情页文本框 CSS
    pub detail_textareas: String,
    /// 返回搜索页的链接
    pub reset_link: Locator,
    /// 搜索页路由（正则）
    pub search_route_pattern: String,
}

impl Default for PortalLayout {
    fn default() -> Self {
        Self {
            search_field: Locator::Within {
                scope: Box::new(Locator::CssHasText {
                    css: "div.ods-form-item".to_string(),
                    text: "Número de expediente".to_string(),
                }),
                css: "input.ods-input__inner".to_string(),
            },
            apply_filters: Locator::Role {
                role: "button".to_string(),
                name_pattern: "Aplicar filtros".to_string(),
            },
            result_button_css: "button".to_string(),
            no_results: Locator::Text {
                pattern: "sin resultados|no se encontraron".to_string(),
            },
            detail_textareas: "textarea.ods-textarea__inner".to_string(),
            reset_link: Locator::CssHasText {
                css: "a[href=\"#/search\"]".to_string(),
                text: "Buscar expedientes".to_string(),
            },
            search_route_pattern: ".*#/search".to_string(),
        }
    }
}

impl PortalLayout {
    /// 文本包含编码的结果按钮
    pub fn result_button(&self, code: &str) -> Locator {
        Locator::CssHasText {
            css: self.result_button_css.clone(),
            text: code.to_string(),
        }
    }

    pub fn detail_areas(&self) -> Locator {
        Locator::Css(self.detail_textareas.clone())
    }
}
