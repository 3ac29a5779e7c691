//! `GET /`: the upload page.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ---------------------------------------------------------------------------
// Page HTML (self-contained, no external resources)
// ---------------------------------------------------------------------------

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>CV Text Extractor</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #fafaf9; color: #1c1917; min-height: 100vh;
      display: flex; flex-wrap: wrap;
    }
    aside {
      width: 260px; padding: 32px 24px; background: #f5f5f4;
      border-right: 1px solid #e7e5e4;
    }
    aside h2 { font-size: 18px; margin-bottom: 16px; }
    aside ol { padding-left: 20px; color: #44403c; font-size: 14px; line-height: 1.8; }
    main { flex: 1; min-width: 320px; padding: 32px; max-width: 880px; }
    h1 { font-size: 26px; margin-bottom: 8px; }
    p.lead { color: #78716c; font-size: 14px; margin-bottom: 24px; }
    .btn {
      display: inline-flex; align-items: center; justify-content: center;
      padding: 12px 20px; border-radius: 10px; font-size: 15px; font-weight: 500;
      cursor: pointer; border: none;
    }
    .btn-primary { background: #4a7c59; color: white; }
    .btn-secondary { background: white; color: #44403c; border: 1px solid #d6d3d1; }
    .btn:disabled { opacity: 0.5; cursor: not-allowed; }
    .picker { display: flex; gap: 12px; align-items: center; margin-bottom: 16px; }
    #file-name { color: #57534e; font-size: 14px; }
    #file-input { display: none; }
    .status { margin: 16px 0; font-size: 14px; }
    .status.success { color: #16a34a; }
    .status.error { color: #dc2626; }
    #result { display: none; }
    textarea {
      width: 100%; height: 320px; padding: 12px; margin-bottom: 16px;
      border: 1px solid #d6d3d1; border-radius: 10px; font-size: 14px;
      font-family: ui-monospace, SFMono-Regular, Menlo, monospace; resize: vertical;
    }
    label { display: block; font-size: 14px; font-weight: 500; margin-bottom: 8px; }
  </style>
</head>
<body>
  <aside>
    <h2>Instructions</h2>
    <ol>
      <li>Upload your CV file (PDF or image).</li>
      <li>Wait for processing and review the extracted text.</li>
      <li>Download the Word file containing the text.</li>
    </ol>
  </aside>

  <main>
    <h1>CV Text Extractor</h1>
    <p class="lead">Upload a CV (PDF or image) to extract its text and get a Word file.</p>

    <div class="picker">
      <button class="btn btn-secondary" id="btn-choose">Choose a CV file</button>
      <span id="file-name">PDF, PNG, JPG or JPEG</span>
    </div>
    <input type="file" id="file-input" accept=".pdf,.png,.jpg,.jpeg,application/pdf,image/png,image/jpeg">

    <div class="status" id="status"></div>

    <div id="result">
      <label for="text">Extracted text</label>
      <textarea id="text"></textarea>
      <button class="btn btn-primary" id="btn-download">Download Word file</button>
    </div>
  </main>

  <script>
    var fileInput = document.getElementById('file-input');
    var btnChoose = document.getElementById('btn-choose');
    var fileNameEl = document.getElementById('file-name');
    var statusEl = document.getElementById('status');
    var resultEl = document.getElementById('result');
    var textEl = document.getElementById('text');
    var btnDownload = document.getElementById('btn-download');

    btnChoose.addEventListener('click', function() { fileInput.click(); });
    fileInput.addEventListener('change', handleFile);
    btnDownload.addEventListener('click', download);

    function showStatus(msg, cls) {
      statusEl.textContent = msg;
      statusEl.className = 'status ' + (cls || '');
    }

    function errorMessage(resp) {
      return resp.json()
        .then(function(body) { return (body.error && body.error.message) || 'Request failed'; })
        .catch(function() { return 'Request failed'; });
    }

    function handleFile(e) {
      var file = e.target.files[0];
      if (!file) return;

      fileNameEl.textContent = file.name;
      resultEl.style.display = 'none';
      btnChoose.disabled = true;
      showStatus(file.type === 'application/pdf' ? 'Processing PDF file...' : 'Processing image file...', '');

      var formData = new FormData();
      formData.append('file', file);

      fetch('/api/extract', { method: 'POST', body: formData })
        .then(function(resp) {
          if (!resp.ok) return errorMessage(resp).then(function(m) { throw new Error(m); });
          return resp.json();
        })
        .then(function(body) {
          textEl.value = body.text;
          resultEl.style.display = 'block';
          showStatus('Text extracted successfully!', 'success');
        })
        .catch(function(err) { showStatus(err.message, 'error'); })
        .finally(function() {
          btnChoose.disabled = false;
          fileInput.value = '';
        });
    }

    function download() {
      btnDownload.disabled = true;
      fetch('/api/docx', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ text: textEl.value })
      })
        .then(function(resp) {
          if (!resp.ok) return errorMessage(resp).then(function(m) { throw new Error(m); });
          return resp.blob();
        })
        .then(function(blob) {
          var url = URL.createObjectURL(blob);
          var a = document.createElement('a');
          a.href = url;
          a.download = 'cv_text.docx';
          document.body.appendChild(a);
          a.click();
          a.remove();
          URL.revokeObjectURL(url);
        })
        .catch(function(err) { showStatus(err.message, 'error'); })
        .finally(function() { btnDownload.disabled = false; });
    }
  </script>
</body>
</html>
"#;
