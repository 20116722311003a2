use crate::anchor::WeeklyAnchor;

pub fn render_index(anchor: &WeeklyAnchor) -> String {
    INDEX_HTML
        .replace("{{WEEKDAY}}", &anchor.describe_weekday())
        .replace("{{TIME}}", &anchor.describe_time())
        .replace("{{TIMEZONE}}", anchor.timezone.name())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>CRM Sync Dashboard</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Roboto+Mono:wght@500;700&display=swap');

    :root {
      --bg: #0d1117;
      --card: #111827;
      --ink: #e5e7eb;
      --muted: #9ca3af;
      --accent: #dc2626;
      --ok: #059669;
      --line: rgba(255, 255, 255, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 28px 18px 48px;
    }

    .app {
      width: min(1100px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 3vw, 2.2rem);
    }

    h2 {
      margin: 0 0 14px;
      font-size: 1.1rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 18px;
      padding: 20px;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    .value {
      font-family: "Roboto Mono", monospace;
      font-size: 1.6rem;
      font-weight: 700;
    }

    .countdown {
      font-family: "Roboto Mono", monospace;
      font-size: 3rem;
      font-weight: 700;
      color: var(--accent);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 12px;
      padding: 12px 18px;
      font-size: 0.95rem;
      font-weight: 600;
      cursor: pointer;
      color: white;
      background: #374151;
    }

    button.primary {
      background: var(--accent);
    }

    button:disabled {
      opacity: 0.6;
      cursor: wait;
    }

    .pill-on {
      background: var(--ok);
    }

    input[type="search"] {
      width: 100%;
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 10px 14px;
      color: var(--ink);
    }

    .modules {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(200px, 1fr));
      gap: 14px;
    }

    .module {
      display: grid;
      gap: 10px;
    }

    .module .actions {
      display: flex;
      gap: 8px;
    }

    .module button {
      padding: 8px 12px;
      font-size: 0.85rem;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th, td {
      text-align: left;
      padding: 8px;
      border-bottom: 1px solid var(--line);
      white-space: nowrap;
      overflow: hidden;
      text-overflow: ellipsis;
      max-width: 240px;
    }

    .banner {
      display: none;
      justify-content: space-between;
      align-items: center;
      background: rgba(220, 38, 38, 0.15);
      border: 1px solid var(--accent);
      border-radius: 12px;
      padding: 12px 16px;
    }

    .toast {
      display: none;
      position: fixed;
      right: 24px;
      bottom: 24px;
      padding: 14px 20px;
      border-radius: 12px;
      cursor: pointer;
    }

    .toast[data-kind="success"] {
      background: var(--ok);
    }

    .toast[data-kind="failure"] {
      background: var(--accent);
    }

    .modal {
      display: none;
      position: fixed;
      inset: 0;
      background: rgba(13, 17, 23, 0.9);
      align-items: center;
      justify-content: center;
    }

    .modal .card {
      width: min(1100px, 92vw);
      max-height: 88vh;
      overflow: auto;
    }

    .pager {
      display: flex;
      gap: 10px;
      align-items: center;
      margin-top: 14px;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>CRM Sync Dashboard</h1>
        <span class="label">Automatic sync every {{WEEKDAY}} at {{TIME}} ({{TIMEZONE}})</span>
      </div>
      <button class="primary" id="sync-btn" type="button">Run Sync</button>
    </header>

    <div class="banner" id="banner">
      <span id="banner-text"></span>
      <button type="button" id="banner-close">Dismiss</button>
    </div>

    <section class="panel">
      <div class="card">
        <div class="label">Next automatic sync</div>
        <div class="countdown" id="countdown">--</div>
        <button type="button" id="auto-btn">Enabled</button>
      </div>
      <div class="card">
        <div class="label">Total records</div>
        <div class="value" id="total">0</div>
      </div>
      <div class="card">
        <div class="label">Avg duration</div>
        <div class="value" id="avg">N/A</div>
      </div>
      <div class="card">
        <div class="label">Error rate</div>
        <div class="value" id="error-rate">0.0%</div>
      </div>
      <div class="card">
        <div class="label">Last success</div>
        <div class="value" id="last-success">N/A</div>
      </div>
    </section>

    <section class="card">
      <h2>Modules</h2>
      <button type="button" id="export-all">Export all</button>
      <input type="search" id="search" placeholder="Filter modules" />
      <div class="modules" id="modules" style="margin-top: 14px"></div>
    </section>

    <section class="card">
      <h2>Sync log</h2>
      <table>
        <thead>
          <tr><th>Time</th><th>Trigger</th><th>Status</th><th>Duration</th><th>Records</th><th>Modules</th><th>Error</th></tr>
        </thead>
        <tbody id="log"></tbody>
      </table>
    </section>

    <section class="card">
      <h2>Backend history</h2>
      <div class="label" id="backend-stats"></div>
      <table>
        <thead>
          <tr><th>Started</th><th>Module</th><th>Status</th><th>Records</th><th>Message</th></tr>
        </thead>
        <tbody id="backend-log"></tbody>
      </table>
    </section>
  </main>

  <div class="toast" id="toast"></div>

  <div class="modal" id="modal">
    <div class="card">
      <header>
        <h2 id="modal-title"></h2>
        <button type="button" id="modal-close">Close</button>
      </header>
      <table id="records"></table>
      <div class="pager">
        <button type="button" id="prev">Prev</button>
        <span id="page-label"></span>
        <button type="button" id="next">Next</button>
      </div>
    </div>
  </div>

  <script>
    const $ = (id) => document.getElementById(id);
    let search = '';
    let autoEnabled = true;
    let browsing = null;

    const pad = (n) => String(n).padStart(2, '0');

    const cell = (tag, text) => {
      const el = document.createElement(tag);
      el.textContent = text;
      return el;
    };

    const post = (path, body) =>
      fetch(path, {
        method: 'POST',
        headers: body ? { 'Content-Type': 'application/json' } : {},
        body: body ? JSON.stringify(body) : undefined
      });

    // a failed export leaves the page alone; the server has raised the banner
    const download = async (path) => {
      const res = await fetch(path);
      if (!res.ok) {
        poll();
        return;
      }
      const blob = await res.blob();
      const disposition = res.headers.get('Content-Disposition') || '';
      const match = disposition.match(/filename="([^"]+)"/);
      const url = window.URL.createObjectURL(blob);
      const a = document.createElement('a');
      a.href = url;
      a.download = match ? match[1] : 'export.csv';
      a.click();
      window.URL.revokeObjectURL(url);
    };

    const renderModules = (modules) => {
      const root = $('modules');
      root.replaceChildren();
      modules.forEach((module) => {
        const card = document.createElement('div');
        card.className = 'card module';
        card.append(cell('div', module.name));
        const count = cell('div', Number(module.record_count).toLocaleString());
        count.className = 'value';
        card.append(count);
        const actions = document.createElement('div');
        actions.className = 'actions';
        const view = cell('button', 'View');
        view.onclick = () => openRecords(module.name, 1);
        const csv = cell('button', 'CSV');
        csv.onclick = () => download(`/api/export/${encodeURIComponent(module.name)}`);
        actions.append(view, csv);
        card.append(actions);
        root.append(card);
      });
    };

    const renderLog = (log) => {
      const body = $('log');
      body.replaceChildren();
      log.forEach((entry) => {
        const row = document.createElement('tr');
        row.append(
          cell('td', new Date(entry.timestamp).toLocaleString()),
          cell('td', entry.trigger),
          cell('td', entry.outcome === 'success' ? 'SUCCESS' : 'FAILED'),
          cell('td', `${entry.duration_seconds.toFixed(2)}s`),
          cell('td', entry.records_updated.toLocaleString()),
          cell('td', entry.modules_processed),
          cell('td', entry.error_message || '')
        );
        body.append(row);
      });
    };

    const render = (data) => {
      if (data.countdown_parts) {
        const t = data.countdown_parts;
        $('countdown').textContent = `${t.days}d ${pad(t.hours)}:${pad(t.minutes)}:${pad(t.seconds)}`;
      }
      autoEnabled = data.auto_sync_enabled;
      $('auto-btn').textContent = autoEnabled ? 'Enabled' : 'Paused';
      $('auto-btn').className = autoEnabled ? 'pill-on' : '';

      const syncing = data.sync_state === 'in_flight';
      $('sync-btn').disabled = syncing;
      $('sync-btn').textContent = syncing ? 'Syncing...' : 'Run Sync';

      $('total').textContent = data.total_records.toLocaleString();
      const m = data.metrics;
      $('avg').textContent = m.avg_duration_seconds == null ? 'N/A' : `${m.avg_duration_seconds.toFixed(2)}s`;
      $('error-rate').textContent = `${m.error_rate_percent.toFixed(1)}%`;
      $('last-success').textContent = m.last_success ? new Date(m.last_success).toLocaleTimeString() : 'N/A';

      $('banner').style.display = data.banner ? 'flex' : 'none';
      $('banner-text').textContent = data.banner ? data.banner.message : '';

      const toast = $('toast');
      toast.style.display = data.toast ? 'block' : 'none';
      toast.dataset.kind = data.toast ? data.toast.kind : '';
      toast.textContent = data.toast ? data.toast.message : '';

      renderModules(data.modules);
      renderLog(data.log);
    };

    const loadBackendHistory = async () => {
      try {
        const [logs, stats] = await Promise.all([
          fetch('/api/backend/sync-logs'),
          fetch('/api/backend/stats')
        ]);
        const body = $('backend-log');
        body.replaceChildren();
        if (logs.ok) {
          (await logs.json()).slice(0, 8).forEach((entry) => {
            const row = document.createElement('tr');
            row.append(
              cell('td', entry.started_at ? new Date(entry.started_at).toLocaleString() : ''),
              cell('td', entry.module || ''),
              cell('td', entry.status || ''),
              cell('td', entry.records_synced == null ? '' : entry.records_synced),
              cell('td', entry.message || '')
            );
            body.append(row);
          });
        }
        if (stats.ok) {
          const counts = await stats.json();
          $('backend-stats').textContent = Object.entries(counts)
            .map(([name, count]) => `${name}: ${count}`)
            .join(' / ');
        }
      } catch (err) {
        console.error('backend history failed', err);
      }
    };

    const poll = async () => {
      try {
        const res = await fetch(`/api/dashboard?search=${encodeURIComponent(search)}`);
        if (res.ok) {
          render(await res.json());
        }
      } catch (err) {
        console.error('dashboard poll failed', err);
      }
    };

    const openRecords = async (name, page) => {
      browsing = { name, page };
      $('modal').style.display = 'flex';
      $('modal-title').textContent = name;
      const table = $('records');
      table.replaceChildren();
      const res = await fetch(`/api/modules/${encodeURIComponent(name)}/records?page=${page}&per_page=20`);
      if (!res.ok) {
        $('page-label').textContent = await res.text();
        return;
      }
      const data = await res.json();
      const columns = data.items.length ? Object.keys(data.items[0]).slice(0, 8) : [];
      const head = document.createElement('tr');
      columns.forEach((key) => head.append(cell('th', key)));
      table.append(head);
      data.items.forEach((item) => {
        const row = document.createElement('tr');
        columns.forEach((key) => row.append(cell('td', item[key] == null ? '' : String(item[key]))));
        table.append(row);
      });
      $('page-label').textContent = `Page ${data.page} of ${Math.max(1, data.total_pages)} (${data.total} records)`;
      $('prev').disabled = data.page <= 1;
      $('next').disabled = data.page >= data.total_pages;
    };

    $('sync-btn').onclick = async () => {
      $('sync-btn').disabled = true;
      await post('/api/sync');
      poll();
      loadBackendHistory();
    };
    $('export-all').onclick = () => download('/api/export-all');
    $('auto-btn').onclick = async () => {
      await post('/api/auto-sync', { enabled: !autoEnabled });
      poll();
    };
    $('banner-close').onclick = async () => {
      await post('/api/notices/banner/dismiss');
      poll();
    };
    $('toast').onclick = async () => {
      await post('/api/notices/toast/dismiss');
      poll();
    };
    $('search').oninput = (event) => {
      search = event.target.value;
      poll();
    };
    $('modal-close').onclick = () => {
      browsing = null;
      $('modal').style.display = 'none';
    };
    $('prev').onclick = () => browsing && openRecords(browsing.name, browsing.page - 1);
    $('next').onclick = () => browsing && openRecords(browsing.name, browsing.page + 1);

    poll();
    loadBackendHistory();
    setInterval(poll, 1000);
  </script>
</body>
</html>
"#;
